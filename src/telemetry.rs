//! Optional log output for hosts that have no subscriber of their own.

/// Installs a global `fmt` subscriber at `level`. Returns `false` if a global
/// subscriber was already set.
pub fn init(level: tracing::Level) -> bool {
    tracing_subscriber::fmt().with_max_level(level).with_target(true).try_init().is_ok()
}
