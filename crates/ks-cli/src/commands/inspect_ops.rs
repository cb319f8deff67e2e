use ks_core::classify::{classify_char, classify_last};
use ks_core::focus::classify_focus;
use ks_core::settings::Settings;

pub fn classify(text: &str) {
    for c in text.chars() {
        println!("U+{:04X}\t{c}\t{}", c as u32, classify_char(c));
    }
    match classify_last(text) {
        Some(state) => println!("last: {state}"),
        None => println!("last: (empty)"),
    }
}

pub fn focus(chain: &[String], settings: &Settings) {
    let area = classify_focus(chain.iter().map(String::as_str), &settings.focus);
    match settings.defaults.for_area(area) {
        Some(state) => println!("{}\tdefault={state}", area.as_str()),
        None => println!("{}\t(no default)", area.as_str()),
    }
}
