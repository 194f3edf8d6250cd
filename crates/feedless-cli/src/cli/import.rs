use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use feedless_core::store::SqliteLog;
use feedless_core::LogRecord;
use tracing::info;

/// Loads one JSON record per line into the log, skipping blank lines and
/// keys that are already present. Returns how many records were new.
pub fn import_jsonl(log: &SqliteLog, path: &Path) -> Result<usize> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open import file: {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: LogRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid record on line {}", index + 1))?;
        records.push(record);
    }

    let inserted = log.insert_records(&records)?;
    info!(path = %path.display(), read = records.len(), inserted, "Imported records");
    Ok(inserted)
}
