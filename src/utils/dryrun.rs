//! Dry-run mode utilities

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

// Process-global flag, set once from the CLI in main()
static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Enable or disable dry-run mode (called early in main)
pub fn set_dry_run(enabled: bool) {
    DRY_RUN.store(enabled, Ordering::Relaxed);
}

/// Check if dry-run mode is enabled
pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::Relaxed)
}

/// Log a dry-run action
pub fn log_action(action: &str) {
    if is_dry_run() {
        println!("  {} {}", "[DRY RUN]".cyan().bold(), action);
    }
}

/// Execute function only if not in dry-run mode
/// Returns Ok(()) in dry-run mode without executing
pub fn exec_unless_dry_run<F>(action_desc: &str, f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    if is_dry_run() {
        log_action(action_desc);
        Ok(())
    } else {
        f()
    }
}
