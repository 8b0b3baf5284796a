//! Secret scoping for step declarations.

use std::collections::HashMap;
use stepwright_core::{Secret, SecretScope, StepDeclaration};

/// All secrets visible to the compiler, keyed by lower-case name.
#[derive(Debug, Clone, Default)]
pub struct SecretMap(HashMap<String, Secret>);

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret, replacing any secret with the same name.
    pub fn insert(&mut self, secret: Secret) {
        self.0.insert(secret.name.to_lowercase(), secret);
    }

    /// Look up a secret by its lower-case name.
    pub fn lookup(&self, name: &str) -> Option<&Secret> {
        self.0.get(name)
    }

    /// Name to value map of the secrets `decl` may use.
    pub fn available_for(&self, decl: &StepDeclaration) -> HashMap<String, String> {
        self.0
            .iter()
            .filter(|(_, secret)| secret.available(decl))
            .map(|(name, secret)| (name.clone(), secret.value.clone()))
            .collect()
    }

    /// Value of the secret requested as `source`, if it exists and `decl` may use it.
    pub fn requested(&self, source: &str, decl: &StepDeclaration) -> Option<&str> {
        self.lookup(&source.to_lowercase())
            .filter(|secret| secret.available(decl))
            .map(|secret| secret.value.as_str())
    }
}

impl FromIterator<Secret> for SecretMap {
    fn from_iter<I: IntoIterator<Item = Secret>>(iter: I) -> Self {
        let mut map = Self::new();
        for secret in iter {
            map.insert(secret);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> SecretMap {
        [
            Secret::new("token", "t0k3n"),
            Secret::new("docker_password", "pw").with_allowed_images(["plugins/docker"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_available_for_filters_by_scope() {
        let decl = StepDeclaration {
            image: "alpine".to_string(),
            ..Default::default()
        };
        let available = secrets().available_for(&decl);
        assert_eq!(available.len(), 1);
        assert_eq!(available.get("token").map(String::as_str), Some("t0k3n"));
    }

    #[test]
    fn test_requested_is_case_insensitive() {
        let decl = StepDeclaration {
            image: "plugins/docker".to_string(),
            ..Default::default()
        };
        let map = secrets();
        assert_eq!(map.requested("Docker_Password", &decl), Some("pw"));
        assert_eq!(map.requested("missing", &decl), None);
    }

    #[test]
    fn test_requested_respects_scope() {
        let decl = StepDeclaration {
            image: "alpine".to_string(),
            ..Default::default()
        };
        assert_eq!(secrets().requested("docker_password", &decl), None);
    }
}
