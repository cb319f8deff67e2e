macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}

pub mod config_ops;
pub mod inspect_ops;
pub mod switch_ops;

use std::path::Path;

use ks_core::settings::{load_settings_file, Settings};

/// Settings from `path`, or the built-in defaults. Exits on error.
pub fn settings_or_default(path: Option<&str>) -> Settings {
    match path {
        Some(path) => die!(load_settings_file(Path::new(path)), "Error loading {path}: {}"),
        None => Settings::default(),
    }
}
