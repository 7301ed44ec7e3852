use anyhow::{Result, bail};
use std::path::Path;

use larder_core::backfill::backfill_created_at;
use larder_core::db::Database;
use larder_core::sync::sync_content_dir;

pub(crate) fn cmd_sync(db: &Database, content_dir: &Path, json: bool) -> Result<()> {
    if !content_dir.is_dir() {
        bail!("Content directory {} does not exist", content_dir.display());
    }
    let summary = sync_content_dir(db, content_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Synced {}: {} inserted, {} updated, {} deleted, {} unchanged",
            content_dir.display(),
            summary.inserted,
            summary.updated,
            summary.deleted,
            summary.unchanged
        );
    }
    Ok(())
}

pub(crate) fn cmd_backfill(
    db: &Database,
    conversations_dir: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let summary = backfill_created_at(db, conversations_dir, dry_run)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if dry_run {
        println!(
            "Dry run. Would update: {}, Skipped: {}",
            summary.updated, summary.skipped
        );
    } else {
        println!(
            "Done. Updated: {}, Skipped: {}",
            summary.updated, summary.skipped
        );
    }
    Ok(())
}
