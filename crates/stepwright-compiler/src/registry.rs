//! Registry credential selection.

use stepwright_core::Registry;
use stepwright_core::image::match_hostname;
use stepwright_core::step::Auth;

/// Credentials of the first registry hosting `image`, or empty credentials.
pub fn resolve_auth(image: &str, registries: &[Registry]) -> Auth {
    registries
        .iter()
        .find(|registry| match_hostname(image, &registry.hostname))
        .map(|registry| Auth {
            username: registry.username.clone(),
            password: registry.password.clone(),
            email: registry.email.clone(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(hostname: &str, username: &str) -> Registry {
        Registry {
            hostname: hostname.to_string(),
            username: username.to_string(),
            password: format!("{}-pw", username),
            email: format!("{}@example.com", username),
        }
    }

    #[test]
    fn test_selects_matching_registry() {
        let registries = vec![registry("docker.io", "hub"), registry("ghcr.io", "gh")];
        let auth = resolve_auth("ghcr.io/x/y", &registries);
        assert_eq!(auth.username, "gh");
        assert_eq!(auth.password, "gh-pw");
        assert_eq!(auth.email, "gh@example.com");
    }

    #[test]
    fn test_first_match_wins() {
        let registries = vec![registry("ghcr.io", "first"), registry("ghcr.io", "second")];
        assert_eq!(resolve_auth("ghcr.io/x/y:1", &registries).username, "first");
    }

    #[test]
    fn test_hub_images_match_docker_io() {
        let registries = vec![registry("ghcr.io", "gh"), registry("index.docker.io", "hub")];
        assert_eq!(resolve_auth("golang:1.22", &registries).username, "hub");
    }

    #[test]
    fn test_no_match_yields_empty_auth() {
        let registries = vec![registry("docker.io", "hub"), registry("ghcr.io", "gh")];
        assert!(resolve_auth("quay.io/x/y", &registries).is_empty());
        assert!(resolve_auth("alpine", &[]).is_empty());
    }
}
