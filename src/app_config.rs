//! Application configuration: config file loading and effective settings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use book_analytics_core::{DEFAULT_LOAD_TIMEOUT, DatabaseOptions, QueryBackend};
use clap::ValueEnum;

use crate::cli::GlobalArgs;

/// Default JSON export read by the file source.
pub const DEFAULT_DATA_PATH: &str = "data/sample_run.json";

/// Default `SQLite` database path.
pub const DEFAULT_DB_PATH: &str = "books.db";

/// Where the corpus comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceKind {
    /// A JSON array export on disk.
    #[default]
    File,
    /// The `SQLite` store.
    Sqlite,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerbositySetting {
    #[default]
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Corpus source.
    pub source: Option<SourceKind>,
    /// JSON export used by the file source.
    pub data_path: Option<PathBuf>,
    /// `SQLite` database path.
    pub db_path: Option<PathBuf>,
    /// Execution strategy.
    pub backend: Option<QueryBackend>,
    /// Corpus load bound in seconds (1..=3600).
    pub load_timeout_secs: Option<u64>,
    /// Database pool max connections (1..=20).
    pub db_max_connections: Option<u32>,
    /// Database busy timeout in milliseconds.
    pub db_busy_timeout_ms: Option<u32>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.load_timeout_secs
            && !(1..=3600).contains(&secs)
        {
            bail!("Invalid config value for `load_timeout_secs`: {secs}. Expected range: 1..=3600");
        }
        if let Some(value) = self.db_max_connections
            && !(1..=20).contains(&value)
        {
            bail!("Invalid config value for `db_max_connections`: {value}. Expected range: 1..=20");
        }
        if let Some(value) = self.db_busy_timeout_ms
            && value > 120_000
        {
            bail!(
                "Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=120000"
            );
        }
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Indicates whether configuration was loaded from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Effective settings after merging CLI, config file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceKind,
    pub data_path: PathBuf,
    pub db_path: PathBuf,
    pub backend: QueryBackend,
    pub load_timeout: Duration,
    pub db_options: DatabaseOptions,
    pub verbosity: VerbositySetting,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/book-analytics/config.toml`
/// 2. `$HOME/.config/book-analytics/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("book-analytics")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("book-analytics")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file '{}' does not exist", path.display());
        }
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(load_file_config(path)?),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Merges command-line values over the config file over built-in defaults.
#[must_use]
pub fn resolve_settings(args: &GlobalArgs, file: Option<&FileConfig>) -> Settings {
    let file = file.cloned().unwrap_or_default();
    let defaults = DatabaseOptions::default();

    let load_timeout = args
        .load_timeout_secs
        .or(file.load_timeout_secs)
        .map_or(DEFAULT_LOAD_TIMEOUT, Duration::from_secs);

    Settings {
        source: args.source.or(file.source).unwrap_or_default(),
        data_path: args
            .data_path
            .clone()
            .or(file.data_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        db_path: args
            .db_path
            .clone()
            .or(file.db_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
        backend: args.backend.or(file.backend).unwrap_or_default(),
        load_timeout,
        db_options: DatabaseOptions {
            max_connections: file.db_max_connections.unwrap_or(defaults.max_connections),
            busy_timeout_ms: file.db_busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
            ..defaults
        },
        verbosity: file.verbosity.unwrap_or_default(),
    }
}

/// Picks the default log level; `RUST_LOG` still overrides it.
///
/// Flags win over the config file. Without either, only warnings and errors
/// reach stderr so stdout stays machine-readable.
#[must_use]
pub fn resolve_default_log_level(verbose: u8, quiet: bool, setting: VerbositySetting) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => match setting {
            VerbositySetting::Default => "warn",
            VerbositySetting::Verbose => "info",
            VerbositySetting::Quiet => "error",
            VerbositySetting::Debug => "debug",
        },
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "source" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `source` value on line {line_no}"))?;
                cfg.source = Some(match parsed.as_str() {
                    "file" => SourceKind::File,
                    "sqlite" => SourceKind::Sqlite,
                    other => bail!(
                        "Invalid `source` value '{other}' on line {line_no}: expected one of: file, sqlite"
                    ),
                });
            }
            "data_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `data_path` value on line {line_no}"))?;
                cfg.data_path = Some(PathBuf::from(parsed));
            }
            "db_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `db_path` value on line {line_no}"))?;
                cfg.db_path = Some(PathBuf::from(parsed));
            }
            "backend" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `backend` value on line {line_no}"))?;
                let backend = parsed.parse::<QueryBackend>().map_err(|reason| {
                    anyhow::anyhow!("Invalid `backend` value on line {line_no}: {reason}")
                })?;
                cfg.backend = Some(backend);
            }
            "load_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `load_timeout_secs` value on line {line_no}")
                })?;
                cfg.load_timeout_secs = Some(parsed);
            }
            "db_max_connections" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `db_max_connections` value on line {line_no}")
                })?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("db_max_connections out of range for u32"))?;
                cfg.db_max_connections = Some(n);
            }
            "db_busy_timeout_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `db_busy_timeout_ms` value on line {line_no}")
                })?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("db_busy_timeout_ms out of range for u32"))?;
                cfg.db_busy_timeout_ms = Some(n);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
