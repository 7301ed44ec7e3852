use std::time::Duration;

use serde_json::json;

use larder_core::models::{Recipe, Tip};

// emerald-500
const EMBED_COLOR: u32 = 0x0010_B981;

/// Posts new-record announcements to a Discord-compatible webhook.
/// Without a webhook URL every call is a no-op, and delivery failures
/// are logged rather than surfaced to the caller.
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    site_url: String,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>, site_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("larder/{} (recipe box)", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            webhook_url,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn announce_recipe(&self, recipe: &Recipe) {
        self.send(json!({ "embeds": [recipe_embed(&self.site_url, recipe)] }))
            .await;
    }

    pub async fn announce_tip(&self, tip: &Tip) {
        self.send(json!({ "embeds": [tip_embed(&self.site_url, tip)] }))
            .await;
    }

    async fn send(&self, payload: serde_json::Value) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        if let Err(e) = self.client.post(url).json(&payload).send().await {
            eprintln!("Warning: webhook notification failed: {e:#}");
        }
    }
}

fn recipe_embed(site_url: &str, recipe: &Recipe) -> serde_json::Value {
    let mut fields = vec![json!({
        "name": "Category",
        "value": capitalize(&recipe.category),
        "inline": true,
    })];
    if recipe.cook_time > 0 {
        fields.push(json!({
            "name": "Cook time",
            "value": format!("{} min", recipe.cook_time),
            "inline": true,
        }));
    }
    if !recipe.portion_count.is_empty() {
        fields.push(json!({
            "name": "Serves",
            "value": recipe.portion_count,
            "inline": true,
        }));
    }
    if !recipe.ingredients.is_empty() {
        fields.push(json!({
            "name": "Ingredients",
            "value": format!("{} items", recipe.ingredients.len()),
            "inline": true,
        }));
    }
    json!({
        "title": recipe.title,
        "url": format!("{site_url}/recipes/{}", recipe.id),
        "description": "New recipe added",
        "color": EMBED_COLOR,
        "fields": fields,
    })
}

fn tip_embed(site_url: &str, tip: &Tip) -> serde_json::Value {
    let mut fields = vec![json!({
        "name": "Category",
        "value": capitalize(&tip.category),
        "inline": true,
    })];
    if !tip.items.is_empty() {
        fields.push(json!({
            "name": "Items",
            "value": tip.items.len().to_string(),
            "inline": true,
        }));
    }
    json!({
        "title": tip.title,
        "url": format!("{site_url}/tips/{}", tip.id),
        "description": "New food tip added",
        "color": EMBED_COLOR,
        "fields": fields,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str().to_lowercase()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::models::{Ingredient, SourceType, TipItem};

    fn sample_recipe() -> Recipe {
        Recipe {
            id: 3,
            title: "Miso Soup".to_string(),
            category: "dinner".to_string(),
            prep_time: 5,
            cook_time: 15,
            portion_count: "4".to_string(),
            ingredients: vec![
                Ingredient {
                    name: "miso paste".to_string(),
                    amount: "3 tbsp".to_string(),
                },
                Ingredient {
                    name: "tofu".to_string(),
                    amount: "200g".to_string(),
                },
            ],
            directions: vec!["simmer".to_string()],
            notes: String::new(),
            source_conversation: None,
            created_at: None,
            source_type: SourceType::Ai,
            highlight: false,
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("dinner"), "Dinner");
        assert_eq!(capitalize("DINNER"), "Dinner");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_recipe_embed_full() {
        let embed = recipe_embed("https://larder.example", &sample_recipe());
        assert_eq!(embed["title"], "Miso Soup");
        assert_eq!(embed["url"], "https://larder.example/recipes/3");
        assert_eq!(embed["description"], "New recipe added");
        assert_eq!(embed["color"], 0x0010_B981);

        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["name"], "Category");
        assert_eq!(fields[0]["value"], "Dinner");
        assert_eq!(fields[1]["value"], "15 min");
        assert_eq!(fields[2]["value"], "4");
        assert_eq!(fields[3]["value"], "2 items");
    }

    #[test]
    fn test_recipe_embed_omits_empty_fields() {
        let mut recipe = sample_recipe();
        recipe.cook_time = 0;
        recipe.portion_count = String::new();
        recipe.ingredients = Vec::new();

        let embed = recipe_embed("https://larder.example", &recipe);
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["name"], "Category");
    }

    #[test]
    fn test_tip_embed() {
        let tip = Tip {
            id: 9,
            title: "Pantry staples".to_string(),
            category: "storage".to_string(),
            items: vec![TipItem {
                name: "rice".to_string(),
                details: "airtight jar".to_string(),
            }],
            notes: String::new(),
            source_conversation: None,
            created_at: None,
            source_type: SourceType::Personal,
            highlight: false,
        };

        let embed = tip_embed("https://larder.example", &tip);
        assert_eq!(embed["url"], "https://larder.example/tips/9");
        assert_eq!(embed["description"], "New food tip added");
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1]["name"], "Items");
        assert_eq!(fields[1]["value"], "1");
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        let notifier = Notifier::new(None, "https://larder.example/");
        assert_eq!(notifier.site_url, "https://larder.example");
    }
}
