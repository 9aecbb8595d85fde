// Logger setup plus per-guess tracing macros that compile away in release builds.

use env_logger::{Env, Target};

/// Log to stderr so game output on stdout stays clean. `RUST_LOG` wins over
/// the `verbose` default.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let result = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init();
    if result.is_err() {
        log::debug!("logger already initialized");
    }
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{}};
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        log::info!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{}};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_twice_is_harmless() {
        super::init(false);
        super::init(true);
        debug_log!("debug {}", 1);
        info_log!("info {}", 2);
    }
}
