use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Window (in days) used by "recent" queries.
pub const RECENT_DAYS: i64 = 7;

/// Layout of the `created_at` column: UTC, second precision,
/// lexicographically ordered so string comparison works in SQL.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the `created_at` column layout.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Where a record originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Ai,
    Personal,
    Cookbook,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Personal => "personal",
            Self::Cookbook => "cookbook",
        }
    }

    /// Human-facing label for tables and notification embeds.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Personal => "Personal",
            Self::Cookbook => "Cookbook",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(Self::Ai),
            "personal" => Ok(Self::Personal),
            "cookbook" => Ok(Self::Cookbook),
            _ => bail!("Invalid source type '{s}'. Must be one of: ai, personal, cookbook"),
        }
    }
}

/// Which of the two record tables an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Recipe,
    Tip,
}

impl RecordKind {
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Recipe => "recipe_cards",
            Self::Tip => "food_tips",
        }
    }

    /// Subdirectory of the content directory holding this variant's files.
    /// Matches the table name, so a row's `file_path` reads
    /// `recipe_cards/<name>.json`.
    #[must_use]
    pub fn folder(self) -> &'static str {
        match self {
            Self::Recipe => "recipe_cards",
            Self::Tip => "food_tips",
        }
    }

    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Recipe => "recipe",
            Self::Tip => "tip",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recipe" | "recipes" => Ok(Self::Recipe),
            "tip" | "tips" => Ok(Self::Tip),
            _ => bail!("Invalid record kind '{s}'. Must be 'recipes' or 'tips'"),
        }
    }
}

// --- Record types ---

/// One entry in a recipe's ingredient list. Order is significant and
/// must survive the trip through the serialized payload column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

/// One entry in a tip's item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipItem {
    pub name: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub prep_time: i64,
    pub cook_time: i64,
    pub portion_count: String,
    pub ingredients: Vec<Ingredient>,
    pub directions: Vec<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_conversation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub source_type: SourceType,
    pub highlight: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub items: Vec<TipItem>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_conversation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub source_type: SourceType,
    pub highlight: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub prep_time: i64,
    #[serde(default)]
    pub cook_time: i64,
    #[serde(default)]
    pub portion_count: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_conversation: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTip {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub items: Vec<TipItem>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_conversation: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub highlight: bool,
}

/// Explicitly tagged submission. The `type` field decides which table the
/// record lands in; nothing is inferred from which fields happen to be
/// present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordInput {
    Recipe(NewRecipe),
    Tip(NewTip),
}

impl RecordInput {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Recipe(_) => RecordKind::Recipe,
            Self::Tip(_) => RecordKind::Tip,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Recipe(r) => &r.title,
            Self::Tip(t) => &t.title,
        }
    }
}

// --- Query result types ---

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub recipes: Vec<Recipe>,
    pub tips: Vec<Tip>,
}

/// Every record of both variants, payloads decoded, ordered by title.
#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    pub recipes: Vec<Recipe>,
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Counts {
    pub recipes: i64,
    pub tips: i64,
}

/// Row slice the date backfill works from.
#[derive(Debug, Clone)]
pub struct BackfillRow {
    pub id: i64,
    pub source_conversation: Option<String>,
    pub created_at: Option<String>,
}

// --- Validation ---

pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<()> {
    if recipe.title.trim().is_empty() {
        bail!("Recipe title must not be empty");
    }
    if recipe.category.trim().is_empty() {
        bail!("Recipe category must not be empty");
    }
    if recipe.prep_time < 0 {
        bail!("prep_time must not be negative");
    }
    if recipe.cook_time < 0 {
        bail!("cook_time must not be negative");
    }
    Ok(())
}

pub fn validate_new_tip(tip: &NewTip) -> Result<()> {
    if tip.title.trim().is_empty() {
        bail!("Tip title must not be empty");
    }
    if tip.category.trim().is_empty() {
        bail!("Tip category must not be empty");
    }
    Ok(())
}

pub fn validate_record_input(input: &RecordInput) -> Result<()> {
    match input {
        RecordInput::Recipe(recipe) => validate_new_recipe(recipe),
        RecordInput::Tip(tip) => validate_new_tip(tip),
    }
}
