//! Config validation CLI tool
//!
//! Validates a signalk-trigger configuration file, compiles every trigger
//! condition, and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use trigger_api::{TriggerMode, TriggerSpec};
use trigger_config::TriggerSettings;
use trigger_expr::Evaluator;
use trigger_util::{TriggerId, default_config_path};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a signalk-trigger configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match trigger_config::load_config(&config_path) {
        Ok(settings) => report(&settings),
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                trigger_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                trigger_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                trigger_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                trigger_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        trigger_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}

fn report(settings: &TriggerSettings) -> ExitCode {
    let evaluator = Evaluator::default();
    let problems: Vec<(TriggerId, String)> = settings
        .triggers
        .iter()
        .enumerate()
        .filter_map(|(index, spec)| {
            check_trigger(&evaluator, spec)
                .err()
                .map(|message| (trigger_id(index, spec), message))
        })
        .collect();

    if problems.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("✗ Configuration loads, but some triggers will be skipped");
    }
    println!();
    println!("Summary:");
    println!("  Config version: {}", trigger_config::CURRENT_CONFIG_VERSION);
    println!("  Startup silence: {:?}", settings.startup_silence);
    println!("  Debounce: {:?}", settings.debounce);
    if let Some(self_id) = &settings.self_id {
        println!("  Self id: {}", self_id);
    }
    println!("  Variables: {}", settings.variables.len());
    println!("  Triggers: {}", settings.triggers.len());

    if !settings.variables.is_empty() {
        println!();
        println!("Variables:");
        for variable in &settings.variables {
            println!("  - {} = {}", variable.name, variable.path);
        }
    }

    if !settings.triggers.is_empty() {
        println!();
        println!("Triggers:");
        for (index, spec) in settings.triggers.iter().enumerate() {
            println!(
                "  - {} [{}]: {} -> {}",
                trigger_id(index, spec),
                spec.trigger_type.as_deref().unwrap_or("RISING"),
                spec.condition.as_deref().unwrap_or("<missing>"),
                spec.event.as_deref().unwrap_or("<missing>")
            );
        }
    }

    if problems.is_empty() {
        return ExitCode::SUCCESS;
    }

    eprintln!();
    eprintln!("Trigger errors ({}):", problems.len());
    for (id, message) in &problems {
        eprintln!("  - {}: {}", id, message);
    }
    ExitCode::from(1)
}

fn trigger_id(index: usize, spec: &TriggerSpec) -> TriggerId {
    spec.name
        .as_deref()
        .map(TriggerId::new)
        .unwrap_or_else(|| TriggerId::from_index(index))
}

fn check_trigger(evaluator: &Evaluator, spec: &TriggerSpec) -> Result<(), String> {
    let condition = spec.condition.as_deref().ok_or("missing condition")?;
    if spec.event.as_deref().is_none_or(str::is_empty) {
        return Err("missing event".into());
    }
    if let Some(mode) = &spec.trigger_type {
        mode.parse::<TriggerMode>().map_err(|e| e.to_string())?;
    }
    let expression = evaluator
        .compile(condition)
        .map_err(|e| format!("cannot compile '{}': {}", condition, e))?;
    if expression.ast().is_none() {
        return Err("condition is blank".into());
    }
    Ok(())
}
