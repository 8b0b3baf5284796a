//! Names and paths shared with execution backends.

/// Workspace path exported to every step.
pub const ENV_WORKSPACE: &str = "CI_WORKSPACE";
/// Scheduling name exported to every step.
pub const ENV_STEP_NAME: &str = "CI_STEP_NAME";

/// Name of the per-pipeline network.
pub fn default_network(prefix: &str) -> String {
    format!("{}_default", prefix)
}

/// Bind spec of the per-pipeline workspace volume.
pub fn workspace_volume(prefix: &str, base: &str) -> String {
    format!("{}:{}", default_network(prefix), base)
}

/// Join slash-separated path elements and normalize the result.
///
/// Empty elements are ignored; an all-empty input yields an empty string.
pub fn join_path(elements: &[&str]) -> String {
    let joined = elements
        .iter()
        .filter(|e| !e.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        return joined;
    }
    clean_path(&joined)
}

fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let cleaned = parts.join("/");
    match (rooted, cleaned.is_empty()) {
        (true, _) => format!("/{}", cleaned),
        (false, true) => ".".to_string(),
        (false, false) => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(default_network("p"), "p_default");
        assert_eq!(workspace_volume("p", "/ci"), "p_default:/ci");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["/ci", "job1", "sub"]), "/ci/job1/sub");
        assert_eq!(join_path(&["/ci", "job1", ""]), "/ci/job1");
        assert_eq!(join_path(&["/ci/", "./job1", "../other"]), "/ci/other");
        assert_eq!(join_path(&["/", ".."]), "/");
        assert_eq!(join_path(&["a", "..", ".."]), "..");
        assert_eq!(join_path(&["", ""]), "");
    }
}
