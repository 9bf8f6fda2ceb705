//! Env overrides from a `.env` file. Kept apart from other config tests so no `LEXIBATCH_*`
//! variable set elsewhere can leak into these loads.

use lexibatch::RunnerOpts;
use std::fs;

#[test]
fn test_dotenv_overrides_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".lexibatch.toml"),
        "[runner]\nmax_concurrency = 4\nshow_progress = true\n",
    )
    .unwrap();
    fs::write(
        dir.path().join(".env"),
        "LEXIBATCH_MAX_CONCURRENCY=32\nLEXIBATCH_SHOW_PROGRESS=false\n",
    )
    .unwrap();

    let opts = RunnerOpts::load(dir.path());
    assert_eq!(opts.max_concurrency, 32);
    assert!(!opts.show_progress);
}

#[test]
fn test_dotenv_is_scoped_to_its_directory() {
    let with_env = tempfile::tempdir().unwrap();
    let without_env = tempfile::tempdir().unwrap();
    fs::write(
        with_env.path().join(".env"),
        "LEXIBATCH_MAX_CONCURRENCY=32\n",
    )
    .unwrap();

    assert_eq!(RunnerOpts::load(with_env.path()).max_concurrency, 32);
    assert!(std::env::var("LEXIBATCH_MAX_CONCURRENCY").is_err());
    assert_eq!(
        RunnerOpts::load(without_env.path()).max_concurrency,
        RunnerOpts::default().max_concurrency
    );
}
