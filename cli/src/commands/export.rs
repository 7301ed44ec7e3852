use anyhow::{Context, Result};
use std::path::Path;

use larder_core::db::Database;

/// Dump every record as pretty-printed JSON, to stdout or a file.
pub(crate) fn cmd_export(db: &Database, output: Option<&Path>, json: bool) -> Result<()> {
    let export = db.export_all()?;
    let pretty = serde_json::to_string_pretty(&export)?;

    let Some(path) = output else {
        println!("{pretty}");
        return Ok(());
    };

    std::fs::write(path, &pretty).with_context(|| format!("Failed to write {}", path.display()))?;
    if json {
        let report = serde_json::json!({
            "recipes": export.recipes.len(),
            "tips": export.tips.len(),
            "output": path.display().to_string(),
        });
        println!("{report}");
    } else {
        println!(
            "Exported {} recipes and {} tips to {}",
            export.recipes.len(),
            export.tips.len(),
            path.display()
        );
    }
    Ok(())
}
