use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const DEFAULT_SITE_URL: &str = "http://127.0.0.1:65432";

pub struct Config {
    pub db_path: PathBuf,
    pub content_dir: PathBuf,
    pub data_dir: PathBuf,
    pub api_token: Option<String>,
    pub webhook_url: Option<String>,
    pub site_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "larder").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = match std::env::var_os("LARDER_DB") {
            Some(path) => PathBuf::from(path),
            None => data_dir.join("larder.db"),
        };
        let content_dir = match std::env::var_os("LARDER_CONTENT_DIR") {
            Some(path) => PathBuf::from(path),
            None => data_dir.join("content"),
        };
        let api_token = env_string("LARDER_API_TOKEN");
        let webhook_url = env_string("LARDER_WEBHOOK_URL");
        let site_url =
            env_string("LARDER_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

        Ok(Config {
            db_path,
            content_dir,
            data_dir,
            api_token,
            webhook_url,
            site_url,
        })
    }

    /// Load the API token from disk, or generate a new one.
    ///
    /// Returns `(token, newly_created)` where `newly_created` is true when
    /// a fresh token was just generated (first run).
    pub fn load_or_create_api_token(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_token");

        if path.exists() {
            let token = std::fs::read_to_string(&path).context("Failed to read API token file")?;
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok((token, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let token = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &token).context("Failed to write API token file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API token file permissions")?;
        }
        eprintln!("Generated new API token: {token}");
        eprintln!("Include in requests: Authorization: Bearer {token}");
        Ok((token, true))
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
