//! Container image reference parsing and matching.
//!
//! References follow the usual registry grammar:
//! `[domain[:port]/]path[:tag][@digest]`. A reference without an explicit
//! domain lives on Docker Hub, and single-component Hub paths live under
//! `library/`.

use regex::Regex;
use std::sync::LazyLock;

use crate::{Error, Result};

/// Registry domain assumed for references without one.
pub const DEFAULT_DOMAIN: &str = "docker.io";

const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
const OFFICIAL_REPO_PREFIX: &str = "library/";

static PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*$")
        .unwrap()
});

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w][\w.-]{0,127}$").unwrap());

/// A parsed, normalized image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub domain: String,
    pub path: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    /// Parse an image reference, normalizing Docker Hub names.
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || Error::InvalidReference(reference.to_string());

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) if !digest.is_empty() => (name, Some(digest.to_string())),
            Some(_) => return Err(invalid()),
            None => (reference, None),
        };

        let (domain, remainder) = match name.split_once('/') {
            Some((first, rest)) if is_domain(first) => (first.to_string(), rest),
            _ => (DEFAULT_DOMAIN.to_string(), name),
        };
        let domain = if domain == LEGACY_DEFAULT_DOMAIN {
            DEFAULT_DOMAIN.to_string()
        } else {
            domain
        };

        let (path, tag) = match remainder.rsplit_once(':') {
            Some((path, tag)) => (path, Some(tag.to_string())),
            None => (remainder, None),
        };

        if !PATH_REGEX.is_match(path) {
            return Err(invalid());
        }
        if let Some(tag) = &tag {
            if !TAG_REGEX.is_match(tag) {
                return Err(invalid());
            }
        }

        let path = if domain == DEFAULT_DOMAIN && !path.contains('/') {
            format!("{}{}", OFFICIAL_REPO_PREFIX, path)
        } else {
            path.to_string()
        };

        Ok(Self {
            domain,
            path,
            tag,
            digest,
        })
    }

    /// The short name without tag or digest, as users usually write it.
    pub fn familiar_name(&self) -> String {
        if self.domain != DEFAULT_DOMAIN {
            return format!("{}/{}", self.domain, self.path);
        }
        match self.path.strip_prefix(OFFICIAL_REPO_PREFIX) {
            Some(short) if !short.contains('/') => short.to_string(),
            _ => self.path.clone(),
        }
    }
}

fn is_domain(component: &str) -> bool {
    component.contains('.')
        || component.contains(':')
        || component == "localhost"
        || component.chars().any(|c| c.is_ascii_uppercase())
}

/// Short name used for comparisons; unparseable references compare verbatim.
fn trim_image(name: &str) -> String {
    ImageRef::parse(name)
        .map(|r| r.familiar_name())
        .unwrap_or_else(|_| name.to_string())
}

/// Whether `image` names the same repository as any of `patterns`, ignoring tags.
pub fn match_image<S: AsRef<str>>(image: &str, patterns: &[S]) -> bool {
    let image = trim_image(image);
    patterns
        .iter()
        .any(|pattern| trim_image(pattern.as_ref()) == image)
}

/// Whether `image` is hosted on the registry `hostname`.
pub fn match_hostname(image: &str, hostname: &str) -> bool {
    let Ok(reference) = ImageRef::parse(image) else {
        return false;
    };
    let hostname = if hostname == LEGACY_DEFAULT_DOMAIN {
        DEFAULT_DOMAIN
    } else {
        hostname
    };
    reference.domain == hostname
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_official_image() {
        let r = ImageRef::parse("golang:1.22").unwrap();
        assert_eq!(r.domain, "docker.io");
        assert_eq!(r.path, "library/golang");
        assert_eq!(r.tag.as_deref(), Some("1.22"));
        assert_eq!(r.familiar_name(), "golang");
    }

    #[test]
    fn test_parse_registry_with_port() {
        let r = ImageRef::parse("localhost:5000/team/app:dev@sha256:abc").unwrap();
        assert_eq!(r.domain, "localhost:5000");
        assert_eq!(r.path, "team/app");
        assert_eq!(r.tag.as_deref(), Some("dev"));
        assert_eq!(r.digest.as_deref(), Some("sha256:abc"));
        assert_eq!(r.familiar_name(), "localhost:5000/team/app");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse("docker.io/Upper/Case").is_err());
        assert!(ImageRef::parse("alpine@").is_err());
    }

    #[test]
    fn test_match_image_ignores_tag_and_hub_prefix() {
        let patterns = ["plugins/docker", "plugins/kaniko"];
        assert!(match_image("plugins/docker:20", &patterns));
        assert!(match_image("docker.io/plugins/docker", &patterns));
        assert!(match_image("index.docker.io/plugins/kaniko:latest", &patterns));
        assert!(!match_image("plugins/git", &patterns));
        assert!(!match_image("ghcr.io/plugins/docker", &patterns));
    }

    #[test]
    fn test_match_image_without_patterns() {
        let patterns: [&str; 0] = [];
        assert!(!match_image("alpine", &patterns));
    }

    #[test]
    fn test_match_hostname() {
        assert!(match_hostname("ghcr.io/x/y", "ghcr.io"));
        assert!(match_hostname("alpine", "docker.io"));
        assert!(match_hostname("alpine:3", "index.docker.io"));
        assert!(!match_hostname("ghcr.io/x/y", "docker.io"));
        assert!(match_hostname("registry.local:5000/app", "registry.local:5000"));
        assert!(!match_hostname("", "docker.io"));
    }
}
