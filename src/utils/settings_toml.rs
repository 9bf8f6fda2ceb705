//! Layered runner settings: defaults, then `.lexibatch.toml` in a directory, then env vars
//! (process env first, falling back to a `.env` file in the same directory, read without
//! exporting it).

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::RunnerOpts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SettingsToml {
    #[serde(default)]
    runner: RunnerSection,
}

#[derive(Debug, Default, Deserialize)]
struct RunnerSection {
    max_concurrency: Option<usize>,
    progress_description: Option<String>,
    show_progress: Option<bool>,
    handle_interrupt: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if missing, unreadable or malformed.
pub(crate) fn load_settings_toml(dir: &Path) -> Option<SettingsToml> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file).
pub(crate) fn apply_file_to_opts(file: &SettingsToml, opts: &mut RunnerOpts) {
    let section = &file.runner;
    apply_file_opt!(section, opts, max_concurrency);
    apply_file_opt!(section, opts, progress_description);
    apply_file_opt!(section, opts, show_progress);
    apply_file_opt!(section, opts, handle_interrupt);
}

/// Read `<PREFIX>_<key>` from the process env, falling back to `dir/.env`.
/// The `.env` file is only read; the process env is left untouched.
fn env_value(dir: &Path, key: &str) -> Option<String> {
    let name = PackagePaths::get().env_var(key);
    let clean = |s: String| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    if let Some(v) = std::env::var(&name).ok().and_then(clean) {
        return Some(v);
    }
    dotenvy::from_path_iter(dir.join(".env"))
        .ok()?
        .filter_map(Result::ok)
        .find(|(k, _)| *k == name)
        .and_then(|(_, v)| clean(v))
}

fn parse_env<T: FromStr>(dir: &Path, key: &str) -> Option<T> {
    let raw = env_value(dir, key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!(
                "Ignoring {}={:?}: not a valid value",
                PackagePaths::get().env_var(key),
                raw
            );
            None
        }
    }
}

/// Apply env overrides (`MAX_CONCURRENCY`, `SHOW_PROGRESS`) on top of opts.
pub(crate) fn apply_env_to_opts(dir: &Path, opts: &mut RunnerOpts) {
    if let Some(n) = parse_env::<usize>(dir, "MAX_CONCURRENCY") {
        opts.max_concurrency = n;
    }
    if let Some(b) = parse_env::<bool>(dir, "SHOW_PROGRESS") {
        opts.show_progress = b;
    }
}

impl RunnerOpts {
    /// Defaults, then `dir/.lexibatch.toml` `[runner]`, then `LEXIBATCH_*` env vars.
    ///
    /// Problems with the file or env values are logged and skipped; they never fail the load.
    /// A zero `max_concurrency` is left as-is and rejected when a batch starts.
    pub fn load(dir: &Path) -> Self {
        let mut opts = Self::default();
        if let Some(file) = load_settings_toml(dir) {
            apply_file_to_opts(&file, &mut opts);
        }
        apply_env_to_opts(dir, &mut opts);
        log::debug!("Runner options: {:?}", opts);
        opts
    }
}
