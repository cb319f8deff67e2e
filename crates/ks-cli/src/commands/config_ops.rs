use std::fs;

use ks_core::settings::{default_toml, parse_settings_toml};

pub fn settings_export() {
    print!("{}", default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(parse_settings_toml(&content), "Error: {}");
    println!(
        "OK: strategy.switcher={}, strategy.feedback={}, automation.max_attempts={}, automation.indicator_names={}",
        s.switcher(),
        s.feedback_kind().name(),
        s.automation.max_attempts,
        s.automation.indicator_names.len(),
    );
}
