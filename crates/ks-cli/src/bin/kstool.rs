use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ks_cli::commands::{config_ops, inspect_ops, settings_or_default, switch_ops};
use ks_cli::trace_init;

#[derive(Parser)]
#[command(name = "kstool", about = "Context-aware input-method switch diagnostics")]
struct Cli {
    /// Write JSON trace logs to this directory (needs --features trace)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Classify each character of a string
    Classify {
        /// Text to classify
        text: String,
    },
    /// Classify a focus chain (focused component first)
    Focus {
        /// Container type names
        #[arg(required = true)]
        chain: Vec<String>,
        /// Settings TOML file
        #[arg(long)]
        settings: Option<String>,
    },
    /// Report the input method's current mode
    Probe {
        /// Settings TOML file
        #[arg(long)]
        settings: Option<String>,
    },
    /// Flip the input method once
    Toggle {
        /// Switch strategy (keystroke | ui-automation); defaults to the settings
        #[arg(long)]
        strategy: Option<String>,
        /// Settings TOML file
        #[arg(long)]
        settings: Option<String>,
    },
    /// Replay an editor event script against a simulated input method
    Replay {
        /// Script TOML file
        script: String,
        /// Settings TOML file
        #[arg(long)]
        settings: Option<String>,
        /// Print decisions as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let _trace = match &cli.log_dir {
        Some(dir) => trace_init::init_file(dir),
        None => {
            trace_init::init_stderr();
            trace_init::TraceGuard::default()
        }
    };

    match cli.command {
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::Classify { text } => inspect_ops::classify(&text),
        Command::Focus { chain, settings } => {
            inspect_ops::focus(&chain, &settings_or_default(settings.as_deref()))
        }
        Command::Probe { settings } => switch_ops::probe(&settings_or_default(settings.as_deref())),
        Command::Toggle { strategy, settings } => switch_ops::toggle(
            strategy.as_deref(),
            &settings_or_default(settings.as_deref()),
        ),
        Command::Replay {
            script,
            settings,
            json,
        } => switch_ops::replay(&script, settings_or_default(settings.as_deref()), json),
    }
}
