use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::models::{CategoryCount, Recipe, Tip};

/// Read a JSON payload from a file, or from stdin when the path is `-`.
pub(crate) fn read_input(file: &Path) -> Result<Vec<u8>> {
    if file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))
    }
}

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Prep")]
        prep: String,
        #[tabled(rename = "Cook")]
        cook: String,
        #[tabled(rename = "Serves")]
        serves: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            title: marked_title(&r.title, r.highlight),
            category: r.category.clone(),
            prep: format_minutes(r.prep_time),
            cook: format_minutes(r.cook_time),
            serves: if r.portion_count.is_empty() {
                "-".to_string()
            } else {
                r.portion_count.clone()
            },
            source: r.source_type.label().to_string(),
            added: format_added(r.created_at.as_deref()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_tip_table(tips: &[Tip]) {
    #[derive(Tabled)]
    struct TipRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Items")]
        items: usize,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<TipRow> = tips
        .iter()
        .map(|t| TipRow {
            id: t.id,
            title: marked_title(&t.title, t.highlight),
            category: t.category.clone(),
            items: t.items.len(),
            source: t.source_type.label().to_string(),
            added: format_added(t.created_at.as_deref()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_category_table(categories: &[CategoryCount]) {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Records")]
        count: i64,
    }

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            category: c.category.clone(),
            count: c.count,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Highlighted records get a leading star in table output.
fn marked_title(title: &str, highlight: bool) -> String {
    if highlight {
        format!("* {}", truncate(title, 35))
    } else {
        truncate(title, 35)
    }
}

pub(crate) fn format_minutes(minutes: i64) -> String {
    if minutes > 0 {
        format!("{minutes} min")
    } else {
        "-".to_string()
    }
}

/// Date part of a stored timestamp, `-` when the record has none.
pub(crate) fn format_added(created_at: Option<&str>) -> String {
    created_at
        .and_then(|s| s.split(' ').next())
        .unwrap_or("-")
        .to_string()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
