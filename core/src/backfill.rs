use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::models::{RecordKind, TIMESTAMP_FORMAT};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct BackfillSummary {
    pub updated: i64,
    pub skipped: i64,
}

/// Fill in missing `created_at` values from an exported conversations
/// directory. Records are matched to a conversation file by filename,
/// extension included. Rows that already carry a timestamp, or that have
/// no matching conversation, are skipped. With `dry_run` the matches are
/// counted but nothing is written.
pub fn backfill_created_at(
    db: &Database,
    conversations_dir: &Path,
    dry_run: bool,
) -> Result<BackfillSummary> {
    let create_times = read_create_times(conversations_dir)?;
    let mut summary = BackfillSummary::default();

    for kind in [RecordKind::Recipe, RecordKind::Tip] {
        for row in db.backfill_rows(kind)? {
            if row.created_at.is_some() {
                summary.skipped += 1;
                continue;
            }
            let timestamp = row
                .source_conversation
                .as_deref()
                .and_then(|name| create_times.get(name));
            if let Some(ts) = timestamp {
                if !dry_run {
                    db.set_created_at(kind, row.id, ts)?;
                }
                summary.updated += 1;
            } else {
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

/// Conversation filename (with extension) to creation timestamp.
fn read_create_times(dir: &Path) -> Result<HashMap<String, String>> {
    let mut times = HashMap::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if let Some(ts) = normalize_create_time(value.get("create_time")) {
            times.insert(name.to_string(), ts);
        }
    }
    Ok(times)
}

/// Exports carry `create_time` either as a preformatted string or as a
/// Unix epoch number.
fn normalize_create_time(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => {
            let secs = n.as_f64()?;
            let dt = DateTime::<Utc>::from_timestamp(secs as i64, 0)?;
            Some(dt.format(TIMESTAMP_FORMAT).to_string())
        }
        _ => None,
    }
}
