//! Config command handlers: show effective configuration.

use anyhow::Result;

use crate::app_config::{LoadedConfig, Settings};
use crate::output;

pub fn run_config_show_command(loaded: &LoadedConfig, settings: &Settings) -> Result<()> {
    for line in config_show_lines(loaded, settings) {
        println!("{line}");
    }
    Ok(())
}

fn config_show_lines(loaded: &LoadedConfig, settings: &Settings) -> Vec<String> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    let config_file = if loaded.loaded_from_file() {
        "loaded"
    } else {
        "not found (using defaults)"
    };

    output::key_value_lines(&[
        ("config_path", resolved_path),
        ("config_file", config_file.to_string()),
        ("source", settings.source.as_str().to_string()),
        ("data_path", settings.data_path.display().to_string()),
        ("db_path", settings.db_path.display().to_string()),
        ("backend", settings.backend.to_string()),
        ("load_timeout_secs", settings.load_timeout.as_secs().to_string()),
        (
            "db_max_connections",
            settings.db_options.max_connections.to_string(),
        ),
        (
            "db_busy_timeout_ms",
            settings.db_options.busy_timeout_ms.to_string(),
        ),
        ("verbosity", settings.verbosity.as_str().to_string()),
    ])
}
