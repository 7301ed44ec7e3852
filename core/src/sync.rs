use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::db::Database;
use crate::models::{NewRecipe, NewTip, RecordKind, validate_new_recipe, validate_new_tip};

/// Outcome of one synchronizer pass over the content directory.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SyncSummary {
    pub inserted: i64,
    pub updated: i64,
    pub deleted: i64,
    pub unchanged: i64,
}

impl SyncSummary {
    pub fn changed(&self) -> i64 {
        self.inserted + self.updated + self.deleted
    }
}

/// Mirror the JSON files under `content_dir` into the database. Files are
/// keyed by their path relative to `content_dir`; rows whose backing file
/// disappeared are removed first, then files are inserted or refreshed in
/// sorted path order. A file that fails to parse or validate aborts the
/// pass with its path in the error, leaving earlier writes in place.
pub fn sync_content_dir(db: &Database, content_dir: &Path) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    for kind in [RecordKind::Recipe, RecordKind::Tip] {
        sync_folder(db, content_dir, kind, &mut summary)?;
    }
    Ok(summary)
}

fn sync_folder(
    db: &Database,
    content_dir: &Path,
    kind: RecordKind,
    summary: &mut SyncSummary,
) -> Result<()> {
    let folder = content_dir.join(kind.folder());
    // A missing folder is skipped outright rather than treated as empty,
    // so a mistyped content dir cannot wipe the synced rows.
    if !folder.is_dir() {
        return Ok(());
    }

    let mut on_disk: Vec<(String, PathBuf)> = Vec::new();
    for entry in
        fs::read_dir(&folder).with_context(|| format!("Failed to read {}", folder.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        on_disk.push((format!("{}/{name}", kind.folder()), path));
    }
    on_disk.sort();

    let stored = db.file_index(kind)?;
    let disk_paths: HashSet<&str> = on_disk.iter().map(|(rel, _)| rel.as_str()).collect();
    for path in stored.keys() {
        if !disk_paths.contains(path.as_str()) && db.delete_by_path(kind, path)? {
            summary.deleted += 1;
        }
    }

    for (rel_path, path) in &on_disk {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let hash = hash_bytes(&bytes);
        match stored.get(rel_path.as_str()) {
            Some(existing) if *existing == hash => summary.unchanged += 1,
            Some(_) => {
                upsert_file(db, kind, rel_path, &hash, &bytes)
                    .with_context(|| format!("Failed to sync {}", path.display()))?;
                summary.updated += 1;
            }
            None => {
                upsert_file(db, kind, rel_path, &hash, &bytes)
                    .with_context(|| format!("Failed to sync {}", path.display()))?;
                summary.inserted += 1;
            }
        }
    }
    Ok(())
}

fn upsert_file(
    db: &Database,
    kind: RecordKind,
    rel_path: &str,
    hash: &str,
    bytes: &[u8],
) -> Result<()> {
    match kind {
        RecordKind::Recipe => {
            let recipe: NewRecipe = serde_json::from_slice(bytes)?;
            validate_new_recipe(&recipe)?;
            db.upsert_recipe_file(rel_path, hash, &recipe)
        }
        RecordKind::Tip => {
            let tip: NewTip = serde_json::from_slice(bytes)?;
            validate_new_tip(&tip)?;
            db.upsert_tip_file(rel_path, hash, &tip)
        }
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
