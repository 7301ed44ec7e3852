use anyhow::{Result, bail};

use larder_core::db::Database;
use larder_core::models::RecordKind;

use super::helpers::{print_category_table, print_recipe_table, print_tip_table};

pub(crate) fn cmd_list(
    db: &Database,
    kind: RecordKind,
    category: Option<&str>,
    highlighted: bool,
    json: bool,
) -> Result<()> {
    match kind {
        RecordKind::Recipe => {
            let recipes = if highlighted {
                let mut flagged = db.highlighted_recipes()?;
                if let Some(cat) = category {
                    flagged.retain(|r| r.category == cat);
                }
                flagged
            } else {
                db.list_recipes(category)?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&recipes)?);
            } else if recipes.is_empty() {
                println!("No recipes found");
            } else {
                print_recipe_table(&recipes);
            }
        }
        RecordKind::Tip => {
            let tips = if highlighted {
                let mut flagged = db.highlighted_tips()?;
                if let Some(cat) = category {
                    flagged.retain(|t| t.category == cat);
                }
                flagged
            } else {
                db.list_tips(category)?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tips)?);
            } else if tips.is_empty() {
                println!("No tips found");
            } else {
                print_tip_table(&tips);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_categories(db: &Database, json: bool) -> Result<()> {
    let recipes = db.recipe_categories()?;
    let tips = db.tip_categories()?;
    if json {
        let combined = serde_json::json!({ "recipes": recipes, "tips": tips });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }
    if recipes.is_empty() && tips.is_empty() {
        println!("No categories yet");
        return Ok(());
    }
    if !recipes.is_empty() {
        println!("Recipe categories:");
        print_category_table(&recipes);
    }
    if !tips.is_empty() {
        println!("Tip categories:");
        print_category_table(&tips);
    }
    Ok(())
}

pub(crate) fn cmd_recent(db: &Database, days: i64, json: bool) -> Result<()> {
    if days < 1 {
        bail!("days must be at least 1");
    }
    let recipes = db.recent_recipes(days)?;
    let tips = db.recent_tips(days)?;
    if json {
        let combined = serde_json::json!({ "recipes": recipes, "tips": tips });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }
    if recipes.is_empty() && tips.is_empty() {
        println!("No records added in the last {days} days");
        return Ok(());
    }
    if !recipes.is_empty() {
        println!("Recipes:");
        print_recipe_table(&recipes);
    }
    if !tips.is_empty() {
        println!("Tips:");
        print_tip_table(&tips);
    }
    Ok(())
}

pub(crate) fn cmd_stats(db: &Database, json: bool) -> Result<()> {
    let counts = db.counts()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Recipes: {}", counts.recipes);
        println!("Tips: {}", counts.tips);
    }
    Ok(())
}
