//! CLI output formatting.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

/// Writes `value` to stdout as pretty-printed JSON followed by a newline.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

/// Writes `value` as pretty-printed JSON to any writer.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value).context("Failed to serialize response")?;
    writeln!(writer).context("Failed to write response")?;
    Ok(())
}

/// Renders `key = value` lines for human-readable settings output.
pub fn key_value_lines(pairs: &[(&str, String)]) -> Vec<String> {
    pairs
        .iter()
        .map(|(key, value)| format!("{key} = {value}"))
        .collect()
}
