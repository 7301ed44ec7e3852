use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rusqlite::{Connection, params};

use crate::models::{
    BackfillRow, CategoryCount, Counts, ExportData, NewRecipe, NewTip, Recipe, RecordKind,
    SearchResults, SourceType, TIMESTAMP_FORMAT, Tip, now_timestamp,
};

// Base column set, shared by the fresh-create and legacy-rebuild paths.
// Later versions extend it with ALTER TABLE.
const RECIPE_CARDS_COLUMNS: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT UNIQUE,
    file_hash TEXT,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    prep_time INTEGER NOT NULL DEFAULT 0,
    cook_time INTEGER NOT NULL DEFAULT 0,
    portion_count TEXT,
    ingredients TEXT,
    directions TEXT,
    notes TEXT,
    source_conversation TEXT";

const FOOD_TIPS_COLUMNS: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT UNIQUE,
    file_hash TEXT,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    items TEXT,
    notes TEXT,
    source_conversation TEXT";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // Databases that predate version tracking carry the same tables
            // with file_path still NOT NULL. SQLite cannot drop a NOT NULL
            // in place, so those tables are rebuilt and their rows copied
            // across.
            for (table, columns) in [
                ("recipe_cards", RECIPE_CARDS_COLUMNS),
                ("food_tips", FOOD_TIPS_COLUMNS),
            ] {
                if self.file_path_is_not_null(table)? {
                    self.rebuild_table(table, columns)?;
                }
            }

            self.conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS recipe_cards ({RECIPE_CARDS_COLUMNS});

                CREATE TABLE IF NOT EXISTS food_tips ({FOOD_TIPS_COLUMNS});

                CREATE INDEX IF NOT EXISTS idx_recipe_cards_category ON recipe_cards(category);
                CREATE INDEX IF NOT EXISTS idx_food_tips_category ON food_tips(category);

                PRAGMA user_version = 1;"
            ))?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "ALTER TABLE recipe_cards ADD COLUMN created_at TEXT;
                 ALTER TABLE recipe_cards ADD COLUMN source_type TEXT NOT NULL DEFAULT 'ai';
                 ALTER TABLE recipe_cards ADD COLUMN highlight INTEGER NOT NULL DEFAULT 0;
                 ALTER TABLE food_tips ADD COLUMN created_at TEXT;
                 ALTER TABLE food_tips ADD COLUMN source_type TEXT NOT NULL DEFAULT 'ai';
                 ALTER TABLE food_tips ADD COLUMN highlight INTEGER NOT NULL DEFAULT 0;
                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    /// True when `table` exists and its `file_path` column carries NOT NULL.
    fn file_path_is_not_null(&self, table: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == "file_path" {
                let notnull: i64 = row.get(3)?;
                return Ok(notnull == 1);
            }
        }
        Ok(false)
    }

    /// Replace `table` with a fresh one built from `columns`, copying every
    /// column present in both shapes. Row ids are preserved; columns absent
    /// from the new shape are dropped with the old table, and NULLs in a
    /// column that declares a default are copied as that default.
    fn rebuild_table(&self, table: &str, columns: &str) -> Result<()> {
        let old_columns: Vec<String> = {
            let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
            let cols = stmt
                .query_map([], |row| row.get(1))?
                .collect::<Result<Vec<_>, _>>()?;
            cols
        };
        let mut insert_cols: Vec<&str> = Vec::new();
        let mut select_exprs: Vec<String> = Vec::new();
        for decl in columns.split(',') {
            let decl = decl.trim();
            let Some(name) = decl.split_whitespace().next() else {
                continue;
            };
            if !old_columns.iter().any(|c| c == name) {
                continue;
            }
            insert_cols.push(name);
            if let Some(default) = decl.split(" DEFAULT ").nth(1) {
                select_exprs.push(format!("COALESCE({name}, {default})"));
            } else {
                select_exprs.push(name.to_string());
            }
        }
        let insert_list = insert_cols.join(", ");
        let select_list = select_exprs.join(", ");

        self.conn
            .execute_batch(&format!(
                "BEGIN;
                 CREATE TABLE {table}_new ({columns});
                 INSERT INTO {table}_new ({insert_list}) SELECT {select_list} FROM {table};
                 DROP TABLE {table};
                 ALTER TABLE {table}_new RENAME TO {table};
                 COMMIT;"
            ))
            .with_context(|| format!("Failed to rebuild table {table}"))?;
        Ok(())
    }

    // --- Row mapping helpers ---

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            title: row.get(1)?,
            category: row.get(2)?,
            // Older table shapes let these be NULL; a missing value reads as 0.
            prep_time: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
            cook_time: row.get::<_, Option<i64>>(4)?.unwrap_or_default(),
            portion_count: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            ingredients: decode_payload(6, row.get(6)?)?,
            directions: decode_payload(7, row.get(7)?)?,
            notes: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            source_conversation: row.get(9)?,
            created_at: row.get(10)?,
            source_type: source_type_from_column(11, row.get(11)?)?,
            highlight: row.get(12)?,
        })
    }

    fn tip_from_row(row: &rusqlite::Row) -> rusqlite::Result<Tip> {
        Ok(Tip {
            id: row.get(0)?,
            title: row.get(1)?,
            category: row.get(2)?,
            items: decode_payload(3, row.get(3)?)?,
            notes: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            source_conversation: row.get(5)?,
            created_at: row.get(6)?,
            source_type: source_type_from_column(7, row.get(7)?)?,
            highlight: row.get(8)?,
        })
    }

    // --- Recipes ---

    pub fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe> {
        let created_at = recipe.created_at.clone().unwrap_or_else(now_timestamp);
        self.conn.execute(
            "INSERT INTO recipe_cards (title, category, prep_time, cook_time, portion_count,
                 ingredients, directions, notes, source_conversation, created_at, source_type, highlight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                recipe.title,
                recipe.category,
                recipe.prep_time,
                recipe.cook_time,
                recipe.portion_count,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.directions)?,
                recipe.notes,
                recipe.source_conversation,
                created_at,
                recipe.source_type.as_str(),
                recipe.highlight,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_recipe(id)?
            .context("Failed to read back inserted recipe")
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::recipe_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Whole-row replacement of the mutable fields. `created_at` and the
    /// file bookkeeping columns are left untouched.
    pub fn update_recipe(&self, id: i64, recipe: &NewRecipe) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE recipe_cards
             SET title = ?1, category = ?2, prep_time = ?3, cook_time = ?4, portion_count = ?5,
                 ingredients = ?6, directions = ?7, notes = ?8, source_conversation = ?9,
                 source_type = ?10, highlight = ?11
             WHERE id = ?12",
            params![
                recipe.title,
                recipe.category,
                recipe.prep_time,
                recipe.cook_time,
                recipe.portion_count,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.directions)?,
                recipe.notes,
                recipe.source_conversation,
                recipe.source_type.as_str(),
                recipe.highlight,
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    /// Deleting an id that does not exist is a no-op, reported as `false`.
    pub fn delete_recipe(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM recipe_cards WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn list_recipes(&self, category: Option<&str>) -> Result<Vec<Recipe>> {
        if let Some(cat) = category {
            let mut stmt = self.conn.prepare(
                "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                        directions, notes, source_conversation, created_at, source_type, highlight
                 FROM recipe_cards WHERE category = ?1
                 ORDER BY highlight DESC, title ASC",
            )?;
            let recipes = stmt
                .query_map(params![cat], Self::recipe_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(recipes);
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards
             ORDER BY highlight DESC, title ASC",
        )?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn highlighted_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards WHERE highlight = 1
             ORDER BY title ASC",
        )?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    /// Recipes created strictly inside the trailing `days` window, newest
    /// first. A record exactly `days` old falls outside it, and rows that
    /// never got a `created_at` are excluded.
    pub fn recent_recipes(&self, days: i64) -> Result<Vec<Recipe>> {
        let cutoff = recent_cutoff(days);
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards
             WHERE created_at IS NOT NULL AND created_at > ?1
             ORDER BY created_at DESC",
        )?;
        let recipes = stmt
            .query_map(params![cutoff], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    pub fn recipes_by_conversation(&self, conversation: &str) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards WHERE source_conversation = ?1
             ORDER BY id",
        )?;
        let recipes = stmt
            .query_map(params![conversation], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    // --- Tips ---

    pub fn insert_tip(&self, tip: &NewTip) -> Result<Tip> {
        let created_at = tip.created_at.clone().unwrap_or_else(now_timestamp);
        self.conn.execute(
            "INSERT INTO food_tips (title, category, items, notes, source_conversation,
                 created_at, source_type, highlight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                tip.title,
                tip.category,
                serde_json::to_string(&tip.items)?,
                tip.notes,
                tip.source_conversation,
                created_at,
                tip.source_type.as_str(),
                tip.highlight,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_tip(id)?.context("Failed to read back inserted tip")
    }

    pub fn get_tip(&self, id: i64) -> Result<Option<Tip>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::tip_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn update_tip(&self, id: i64, tip: &NewTip) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE food_tips
             SET title = ?1, category = ?2, items = ?3, notes = ?4, source_conversation = ?5,
                 source_type = ?6, highlight = ?7
             WHERE id = ?8",
            params![
                tip.title,
                tip.category,
                serde_json::to_string(&tip.items)?,
                tip.notes,
                tip.source_conversation,
                tip.source_type.as_str(),
                tip.highlight,
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_tip(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_tips WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn list_tips(&self, category: Option<&str>) -> Result<Vec<Tip>> {
        if let Some(cat) = category {
            let mut stmt = self.conn.prepare(
                "SELECT id, title, category, items, notes, source_conversation, created_at,
                        source_type, highlight
                 FROM food_tips WHERE category = ?1
                 ORDER BY highlight DESC, title ASC",
            )?;
            let tips = stmt
                .query_map(params![cat], Self::tip_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(tips);
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips
             ORDER BY highlight DESC, title ASC",
        )?;
        let tips = stmt
            .query_map([], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    pub fn highlighted_tips(&self) -> Result<Vec<Tip>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips WHERE highlight = 1
             ORDER BY title ASC",
        )?;
        let tips = stmt
            .query_map([], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    pub fn recent_tips(&self, days: i64) -> Result<Vec<Tip>> {
        let cutoff = recent_cutoff(days);
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips
             WHERE created_at IS NOT NULL AND created_at > ?1
             ORDER BY created_at DESC",
        )?;
        let tips = stmt
            .query_map(params![cutoff], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    pub fn tips_by_conversation(&self, conversation: &str) -> Result<Vec<Tip>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips WHERE source_conversation = ?1
             ORDER BY id",
        )?;
        let tips = stmt
            .query_map(params![conversation], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    // --- Cross-variant queries ---

    /// Case-insensitive substring search over title, serialized payload,
    /// and notes of both variants. An empty query returns empty results
    /// without touching the store.
    pub fn search(&self, query: &str) -> Result<SearchResults> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(SearchResults {
                recipes: Vec::new(),
                tips: Vec::new(),
            });
        }
        let escaped = trimmed
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards
             WHERE title LIKE ?1 ESCAPE '\\' OR ingredients LIKE ?1 ESCAPE '\\'
                OR directions LIKE ?1 ESCAPE '\\' OR notes LIKE ?1 ESCAPE '\\'
             ORDER BY highlight DESC, title ASC",
        )?;
        let recipes = stmt
            .query_map(params![pattern], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips
             WHERE title LIKE ?1 ESCAPE '\\' OR items LIKE ?1 ESCAPE '\\'
                OR notes LIKE ?1 ESCAPE '\\'
             ORDER BY highlight DESC, title ASC",
        )?;
        let tips = stmt
            .query_map(params![pattern], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchResults { recipes, tips })
    }

    pub fn recipe_categories(&self) -> Result<Vec<CategoryCount>> {
        self.categories("recipe_cards")
    }

    pub fn tip_categories(&self) -> Result<Vec<CategoryCount>> {
        self.categories("food_tips")
    }

    fn categories(&self, table: &str) -> Result<Vec<CategoryCount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT category, COUNT(*) FROM {table} GROUP BY category ORDER BY category"
        ))?;
        let categories = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn counts(&self) -> Result<Counts> {
        let recipes: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM recipe_cards", [], |row| row.get(0))?;
        let tips: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM food_tips", [], |row| row.get(0))?;
        Ok(Counts { recipes, tips })
    }

    pub fn export_all(&self) -> Result<ExportData> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, prep_time, cook_time, portion_count, ingredients,
                    directions, notes, source_conversation, created_at, source_type, highlight
             FROM recipe_cards ORDER BY title ASC",
        )?;
        let recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, items, notes, source_conversation, created_at,
                    source_type, highlight
             FROM food_tips ORDER BY title ASC",
        )?;
        let tips = stmt
            .query_map([], Self::tip_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExportData { recipes, tips })
    }

    // --- File sync bookkeeping ---

    /// Mapping of `file_path` to stored content hash for one variant.
    /// Rows without a backing file do not appear.
    pub fn file_index(&self, kind: RecordKind) -> Result<HashMap<String, String>> {
        let table = kind.table();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT file_path, file_hash FROM {table} WHERE file_path IS NOT NULL"
        ))?;
        let mut index = HashMap::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let path: String = row.get(0)?;
            let hash: Option<String> = row.get(1)?;
            index.insert(path, hash.unwrap_or_default());
        }
        Ok(index)
    }

    pub fn delete_by_path(&self, kind: RecordKind, path: &str) -> Result<bool> {
        let table = kind.table();
        let rows = self.conn.execute(
            &format!("DELETE FROM {table} WHERE file_path = ?1"),
            params![path],
        )?;
        Ok(rows > 0)
    }

    /// Insert-or-replace keyed on the unique `file_path`. On conflict every
    /// non-key column is overwritten with the freshly parsed values.
    pub fn upsert_recipe_file(&self, path: &str, hash: &str, recipe: &NewRecipe) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recipe_cards (file_path, file_hash, title, category, prep_time,
                 cook_time, portion_count, ingredients, directions, notes, source_conversation,
                 created_at, source_type, highlight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(file_path) DO UPDATE SET
                 file_hash = excluded.file_hash,
                 title = excluded.title,
                 category = excluded.category,
                 prep_time = excluded.prep_time,
                 cook_time = excluded.cook_time,
                 portion_count = excluded.portion_count,
                 ingredients = excluded.ingredients,
                 directions = excluded.directions,
                 notes = excluded.notes,
                 source_conversation = excluded.source_conversation,
                 created_at = excluded.created_at,
                 source_type = excluded.source_type,
                 highlight = excluded.highlight",
            params![
                path,
                hash,
                recipe.title,
                recipe.category,
                recipe.prep_time,
                recipe.cook_time,
                recipe.portion_count,
                serde_json::to_string(&recipe.ingredients)?,
                serde_json::to_string(&recipe.directions)?,
                recipe.notes,
                recipe.source_conversation,
                recipe.created_at,
                recipe.source_type.as_str(),
                recipe.highlight,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_tip_file(&self, path: &str, hash: &str, tip: &NewTip) -> Result<()> {
        self.conn.execute(
            "INSERT INTO food_tips (file_path, file_hash, title, category, items, notes,
                 source_conversation, created_at, source_type, highlight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(file_path) DO UPDATE SET
                 file_hash = excluded.file_hash,
                 title = excluded.title,
                 category = excluded.category,
                 items = excluded.items,
                 notes = excluded.notes,
                 source_conversation = excluded.source_conversation,
                 created_at = excluded.created_at,
                 source_type = excluded.source_type,
                 highlight = excluded.highlight",
            params![
                path,
                hash,
                tip.title,
                tip.category,
                serde_json::to_string(&tip.items)?,
                tip.notes,
                tip.source_conversation,
                tip.created_at,
                tip.source_type.as_str(),
                tip.highlight,
            ],
        )?;
        Ok(())
    }

    // --- Backfill support ---

    pub fn backfill_rows(&self, kind: RecordKind) -> Result<Vec<BackfillRow>> {
        let table = kind.table();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, source_conversation, created_at FROM {table} ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BackfillRow {
                    id: row.get(0)?,
                    source_conversation: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_created_at(&self, kind: RecordKind, id: i64, created_at: &str) -> Result<bool> {
        let table = kind.table();
        let rows = self.conn.execute(
            &format!("UPDATE {table} SET created_at = ?1 WHERE id = ?2"),
            params![created_at, id],
        )?;
        Ok(rows > 0)
    }
}

fn recent_cutoff(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Decode a JSON-encoded payload column. NULL and empty text read as an
/// empty list so legacy rows stay loadable.
fn decode_payload<T: serde::de::DeserializeOwned>(
    idx: usize,
    text: Option<String>,
) -> rusqlite::Result<Vec<T>> {
    match text {
        None => Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

fn source_type_from_column(idx: usize, value: String) -> rusqlite::Result<SourceType> {
    value.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
