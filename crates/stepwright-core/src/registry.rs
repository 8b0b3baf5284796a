//! Image registry credentials.

use serde::{Deserialize, Serialize};

/// A known registry and the credentials used to pull from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub email: String,
}
