//! Shared helpers for tests that mutate process state.

use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serialize tests that touch environment variables. Env vars are process
/// globals and the test harness runs threads in parallel, so every test
/// that sets or removes one must hold this guard for its whole body.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
