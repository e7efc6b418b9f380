pub mod constants;
pub(crate) mod defaults;
pub mod models;
pub mod utils;

pub use models::*;
pub use utils::*;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(not(test))]
use std::sync::OnceLock;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sent with every backend request.
pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, VERSION)
}

pub fn version() -> String {
    format!("{} {}", APP_NAME, VERSION)
}

#[cfg(not(test))]
static CONFIG: OnceLock<Configuration> = OnceLock::new();

// Tests run in parallel and each may install its own configuration
#[cfg(test)]
thread_local! {
    static TEST_CONFIG: RefCell<&'static Configuration> = RefCell::new(Box::leak(Box::new(Configuration::default())))
}

/// Prints to stderr when `general.verbose` is set.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)+) => {
        if $crate::config::Configuration::instance().general.verbose {
            eprintln!($($arg)+);
        }
    };
}

pub use verbose;
