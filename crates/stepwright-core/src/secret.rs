//! Secrets visible to the step compiler.

use serde::{Deserialize, Serialize};

use crate::declaration::{PluginClassifier, StepDeclaration};
use crate::image::match_image;

/// Decides whether a secret may be handed to a particular declaration.
pub trait SecretScope {
    fn available(&self, decl: &StepDeclaration) -> bool;
}

/// A named secret value with its usage restrictions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secret {
    /// Lower-case lookup name.
    pub name: String,
    pub value: String,
    /// Plugin images allowed to receive this secret. Empty allows any image.
    pub allowed_images: Vec<String>,
    /// Only expose to plugin-style steps, even without an image list.
    pub plugins_only: bool,
}

impl Secret {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Restrict the secret to plugin steps running one of the given images.
    pub fn with_allowed_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn plugins_only(mut self) -> Self {
        self.plugins_only = true;
        self
    }
}

impl SecretScope for Secret {
    fn available(&self, decl: &StepDeclaration) -> bool {
        if self.allowed_images.is_empty() {
            return !self.plugins_only || decl.is_plugin();
        }
        decl.is_plugin() && match_image(&decl.image, &self.allowed_images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(image: &str, commands: &[&str]) -> StepDeclaration {
        StepDeclaration {
            image: image.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unrestricted_secret_is_available() {
        let secret = Secret::new("TOKEN", "abc");
        assert_eq!(secret.name, "token");
        assert!(secret.available(&decl("alpine", &["echo hi"])));
        assert!(secret.available(&decl("plugins/docker", &[])));
    }

    #[test]
    fn test_image_restricted_secret() {
        let secret = Secret::new("docker_password", "pw").with_allowed_images(["plugins/docker"]);
        assert!(secret.available(&decl("plugins/docker:20", &[])));
        assert!(!secret.available(&decl("alpine", &[])));
    }

    #[test]
    fn test_image_restricted_secret_requires_plugin() {
        let secret = Secret::new("docker_password", "pw").with_allowed_images(["plugins/docker"]);
        assert!(!secret.available(&decl("plugins/docker", &["echo $DOCKER_PASSWORD"])));
        assert!(!secret.available(&decl("plugins/docker:20", &["docker login"])));
    }

    #[test]
    fn test_plugins_only_secret() {
        let secret = Secret::new("deploy_key", "k").plugins_only();
        assert!(secret.available(&decl("alpine", &[])));
        assert!(!secret.available(&decl("alpine", &["cat $DEPLOY_KEY"])));
    }
}
