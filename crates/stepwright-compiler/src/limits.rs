//! Resource ceilings.

use stepwright_core::ResourceLimit;

/// A resource value that may be left unset.
pub trait Ceiling {
    fn is_set(&self) -> bool;
}

impl Ceiling for i64 {
    fn is_set(&self) -> bool {
        *self != 0
    }
}

impl Ceiling for String {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}

/// The ceiling when it is set, otherwise the per-step value.
pub fn resolve<T: Ceiling + Clone>(per_step: &T, ceiling: &T) -> T {
    if ceiling.is_set() {
        ceiling.clone()
    } else {
        per_step.clone()
    }
}

/// Resolve every dimension of `per_step` against `ceiling` independently.
pub fn resolve_limits(per_step: &ResourceLimit, ceiling: &ResourceLimit) -> ResourceLimit {
    ResourceLimit {
        mem_swap_limit: resolve(&per_step.mem_swap_limit, &ceiling.mem_swap_limit),
        mem_limit: resolve(&per_step.mem_limit, &ceiling.mem_limit),
        shm_size: resolve(&per_step.shm_size, &ceiling.shm_size),
        cpu_quota: resolve(&per_step.cpu_quota, &ceiling.cpu_quota),
        cpu_shares: resolve(&per_step.cpu_shares, &ceiling.cpu_shares),
        cpu_set: resolve(&per_step.cpu_set, &ceiling.cpu_set),
    }
}
