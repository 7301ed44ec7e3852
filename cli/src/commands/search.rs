use anyhow::Result;
use std::process;

use larder_core::db::Database;

use super::helpers::{print_recipe_table, print_tip_table};

pub(crate) fn cmd_search(db: &Database, query: &str, json: bool) -> Result<()> {
    let results = db.search(query)?;

    if results.recipes.is_empty() && results.tips.is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if !results.recipes.is_empty() {
        println!("Recipes:");
        print_recipe_table(&results.recipes);
    }
    if !results.tips.is_empty() {
        println!("Tips:");
        print_tip_table(&results.tips);
    }
    Ok(())
}
