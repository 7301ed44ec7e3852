use anyhow::{Context, Result};
use std::path::Path;
use std::process;

use larder_core::db::Database;
use larder_core::models::{
    NewRecipe, NewTip, Recipe, RecordInput, RecordKind, Tip, validate_new_recipe,
    validate_new_tip, validate_record_input,
};

use super::helpers::{format_minutes, json_error, read_input};
use crate::notify::Notifier;

pub(crate) async fn cmd_add(
    db: &Database,
    notifier: &Notifier,
    file: &Path,
    json: bool,
) -> Result<()> {
    let bytes = read_input(file)?;
    let input: RecordInput =
        serde_json::from_slice(&bytes).context("Failed to parse record JSON")?;
    validate_record_input(&input)?;

    match input {
        RecordInput::Recipe(new_recipe) => {
            let recipe = db.insert_recipe(&new_recipe)?;
            notifier.announce_recipe(&recipe).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                println!("Added recipe {}: {}", recipe.id, recipe.title);
            }
        }
        RecordInput::Tip(new_tip) => {
            let tip = db.insert_tip(&new_tip)?;
            notifier.announce_tip(&tip).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&tip)?);
            } else {
                println!("Added tip {}: {}", tip.id, tip.title);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_show(db: &Database, kind: RecordKind, id: i64, json: bool) -> Result<()> {
    match kind {
        RecordKind::Recipe => {
            let Some(recipe) = db.get_recipe(id)? else {
                exit_not_found(kind, id, json);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                print_recipe_detail(&recipe);
            }
        }
        RecordKind::Tip => {
            let Some(tip) = db.get_tip(id)? else {
                exit_not_found(kind, id, json);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tip)?);
            } else {
                print_tip_detail(&tip);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_update(
    db: &Database,
    kind: RecordKind,
    id: i64,
    file: &Path,
    json: bool,
) -> Result<()> {
    let bytes = read_input(file)?;
    match kind {
        RecordKind::Recipe => {
            let update: NewRecipe =
                serde_json::from_slice(&bytes).context("Failed to parse recipe JSON")?;
            validate_new_recipe(&update)?;
            if !db.update_recipe(id, &update)? {
                exit_not_found(kind, id, json);
            }
            let recipe = db
                .get_recipe(id)?
                .context("Failed to read back updated recipe")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&recipe)?);
            } else {
                println!("Updated recipe {id}: {}", recipe.title);
            }
        }
        RecordKind::Tip => {
            let update: NewTip =
                serde_json::from_slice(&bytes).context("Failed to parse tip JSON")?;
            validate_new_tip(&update)?;
            if !db.update_tip(id, &update)? {
                exit_not_found(kind, id, json);
            }
            let tip = db
                .get_tip(id)?
                .context("Failed to read back updated tip")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tip)?);
            } else {
                println!("Updated tip {id}: {}", tip.title);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_delete(db: &Database, kind: RecordKind, id: i64, json: bool) -> Result<()> {
    let deleted = match kind {
        RecordKind::Recipe => db.delete_recipe(id)?,
        RecordKind::Tip => db.delete_tip(id)?,
    };
    if !deleted {
        exit_not_found(kind, id, json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted {} {id}", kind.singular());
    }
    Ok(())
}

fn exit_not_found(kind: RecordKind, id: i64, json: bool) -> ! {
    let noun = match kind {
        RecordKind::Recipe => "Recipe",
        RecordKind::Tip => "Tip",
    };
    let message = format!("{noun} {id} not found");
    if json {
        println!("{}", json_error(&message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

fn print_recipe_detail(recipe: &Recipe) {
    let star = if recipe.highlight { " *" } else { "" };
    println!("{} [{}]{star}", recipe.title, recipe.category);
    println!("Source: {}", recipe.source_type.label());
    if let Some(ref created) = recipe.created_at {
        println!("Added: {created}");
    }
    println!(
        "Prep: {}  Cook: {}  Serves: {}",
        format_minutes(recipe.prep_time),
        format_minutes(recipe.cook_time),
        if recipe.portion_count.is_empty() {
            "-"
        } else {
            recipe.portion_count.as_str()
        }
    );
    if !recipe.ingredients.is_empty() {
        println!();
        println!("Ingredients:");
        for ingredient in &recipe.ingredients {
            if ingredient.amount.is_empty() {
                println!("  - {}", ingredient.name);
            } else {
                println!("  - {} ({})", ingredient.name, ingredient.amount);
            }
        }
    }
    if !recipe.directions.is_empty() {
        println!();
        println!("Directions:");
        for (i, step) in recipe.directions.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }
    if !recipe.notes.is_empty() {
        println!();
        println!("Notes: {}", recipe.notes);
    }
}

fn print_tip_detail(tip: &Tip) {
    let star = if tip.highlight { " *" } else { "" };
    println!("{} [{}]{star}", tip.title, tip.category);
    println!("Source: {}", tip.source_type.label());
    if let Some(ref created) = tip.created_at {
        println!("Added: {created}");
    }
    if !tip.items.is_empty() {
        println!();
        println!("Items:");
        for item in &tip.items {
            if item.details.is_empty() {
                println!("  - {}", item.name);
            } else {
                println!("  - {}: {}", item.name, item.details);
            }
        }
    }
    if !tip.notes.is_empty() {
        println!();
        println!("Notes: {}", tip.notes);
    }
}
