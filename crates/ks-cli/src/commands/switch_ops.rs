use std::path::Path;

use ks_core::backend::{ModeSwitch, StrategyRegistry};
use ks_core::platform::ShellGeneration;
use ks_core::settings::Settings;

use crate::replay;

pub fn probe(settings: &Settings) {
    let mut registry = StrategyRegistry::native(settings);
    println!("shell: {}", ShellGeneration::detect());
    println!("ime: {}", registry.probe().current_state());
    let kind = settings.switcher();
    let state = registry.resolve(kind).current_state();
    println!("{kind}: {state}");
}

pub fn toggle(strategy: Option<&str>, settings: &Settings) {
    let mut registry = StrategyRegistry::native(settings);
    let s = match strategy {
        Some(name) => die!(registry.resolve_name(name), "Error: {}"),
        None => registry.resolve(settings.switcher()),
    };
    let kind = s.kind();
    let before = s.current_state();
    if !s.toggle() {
        eprintln!("{kind}: toggle not performed (see log)");
        std::process::exit(1);
    }
    let after = s.current_state();
    println!("{kind}: {before} -> {after}");
}

pub fn replay(file: &str, settings: Settings, json: bool) {
    let script = die!(replay::load_script(Path::new(file)), "Error loading {file}: {}");
    let report = die!(replay::run(&script, settings), "Error: {}");

    if json {
        for record in &report.records {
            println!("{}", die!(serde_json::to_string(record), "Error: {}"));
        }
        return;
    }
    for r in &report.records {
        let surface = r
            .surface
            .map_or_else(|| "-".to_string(), |s| format!("surface#{s}"));
        println!(
            "{:>6}ms  step {:<3} {:<14} {:<11} {} -> {}  {}",
            r.at_ms, r.step, r.trigger, surface, r.current, r.desired, r.outcome
        );
    }
    println!(
        "{} decisions, {} toggles, final state {}",
        report.records.len(),
        report.toggles,
        report.final_state
    );
}
