//! Layered construction of a step environment.
//!
//! Layers are applied in order to an empty map; a later layer wins on key
//! collisions.

use std::collections::HashMap;

#[derive(Debug, Clone)]
enum EnvLayer {
    Merge(HashMap<String, String>),
    Set(String, String),
}

/// Ordered list of environment merge operations.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    layers: Vec<EnvLayer>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay every entry of `vars`.
    pub fn merge(mut self, vars: HashMap<String, String>) -> Self {
        self.layers.push(EnvLayer::Merge(vars));
        self
    }

    /// Set a single variable.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.layers.push(EnvLayer::Set(key.into(), value.into()));
        self
    }

    pub fn build(self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        for layer in self.layers {
            match layer {
                EnvLayer::Merge(vars) => env.extend(vars),
                EnvLayer::Set(key, value) => {
                    env.insert(key, value);
                }
            }
        }
        env
    }
}
