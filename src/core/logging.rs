//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=verdure::stage=debug` to follow stage transitions.
///
/// # Example
/// ```
/// verdure::core::logging::init();
/// log::info!("Simulation started");
/// ```
pub fn init() {
    // try_init so repeated calls (doc tests, multiple bins in one process) don't panic
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
