//! Utility modules for minikube-dev

pub mod container;
pub mod download;
pub mod dryrun;
pub mod errors;
pub mod prereqs;
pub mod progress;
pub mod prompt;
pub mod retry;

// Re-export commonly used items
pub use container::Docker;
pub use errors::MinikubeDevError;
pub use prereqs::{CommonPrereqs, Prerequisite};
pub use prompt::confirm;
pub use retry::RetryPolicy;

/// Log an informational message through the tracing stack
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ::tracing::info!($($arg)*)
    };
}

/// Log a warning through the tracing stack
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ::tracing::warn!($($arg)*)
    };
}

/// Log an error through the tracing stack
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ::tracing::error!($($arg)*)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_macros_accept_format_args() {
        // These should not panic
        crate::log_info!("cache warmed in {}s", 3);
        crate::log_warn!("{} image(s) failed", 1);
        crate::log_error!("no such profile: {}", "dev");
    }
}
