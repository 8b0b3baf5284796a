//! Container resource limits.

use serde::{Deserialize, Serialize};

/// Resource limits for one container. Zero (or an empty CPU set) means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimit {
    pub mem_swap_limit: i64,
    pub mem_limit: i64,
    pub shm_size: i64,
    pub cpu_quota: i64,
    pub cpu_shares: i64,
    pub cpu_set: String,
}
