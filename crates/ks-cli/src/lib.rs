//! Diagnostics for the key-switch engine: settings files, classification,
//! the native input-method backend and headless replay of event scripts.

pub mod commands;
pub mod replay;
pub mod trace_init;
