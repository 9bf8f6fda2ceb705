//! Application configuration constants.
//! Defaults and package-derived names in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
                env_prefix: format!("{}_", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Settings file looked up in the working directory (e.g. `.lexibatch.toml`).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Full env var name for a setting, e.g. `env_var("MAX_CONCURRENCY")` -> `LEXIBATCH_MAX_CONCURRENCY`.
    pub fn env_var(&self, key: &str) -> String {
        format!("{}{}", self.env_prefix, key)
    }
}

// ---- Runner defaults ----

/// Parallel requests against the LLM API when nothing else is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Progress bar label when the caller does not set one.
pub const DEFAULT_PROGRESS_DESCRIPTION: &str = "Processing";

/// Line written to the progress sink when a batch is interrupted.
pub const INTERRUPT_MESSAGE: &str = "Interrupted. Aborting...";

// ---- Retry ----

/// Retry tuning for flaky external calls.
pub struct RetryConsts;

impl RetryConsts {
    /// Total attempts per call, including the first.
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Wait before the second attempt (seconds). Doubles each attempt.
    pub const INITIAL_DELAY_SECS: u64 = 2;
    /// Upper bound on a single wait (seconds).
    pub const MAX_DELAY_SECS: u64 = 30;
}
