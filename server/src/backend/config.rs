//! # Application Configuration
//!
//! Startup configuration for the backend. The configuration is built once in
//! `main` and handed to [`crate::backend::initialize_backend`]; nothing below
//! this module looks at the process environment.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. Optional YAML file (`studio_desk.yaml` or the path in `STUDIO_DESK_CONFIG`)
//! 3. Environment variables (`DATABASE_URL`, `API_KEY`, `BIND_ADDRESS`, ...)
//!
//! ## YAML Format
//!
//! ```yaml
//! database_url: "sqlite:studio_desk.db"
//! bind_address: "127.0.0.1:3000"
//! documents_dir: "/var/lib/studio-desk/documents"
//! public_base_url: "https://desk.example.com"
//! whatsapp:
//!   automation_url: "http://127.0.0.1:3001"
//!   default_country_code: "55"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_PATH_VAR: &str = "STUDIO_DESK_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "studio_desk.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Relational store connection URL
    pub database_url: String,
    /// Shared secret the upstream auth proxy sends as `x-api-key`.
    /// Requests are not checked when unset.
    pub api_key: Option<String>,
    pub bind_address: String,
    /// Allowed browser origin for the UI
    pub cors_origin: Option<String>,
    /// Root of the per-owner PDF storage
    pub documents_dir: PathBuf,
    /// Base used to build public document links
    pub public_base_url: String,
    pub max_document_bytes: usize,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Local automation process; deep links only when unset
    pub automation_url: Option<String>,
    /// Prefixed to national numbers (10 or 11 digits)
    pub default_country_code: String,
    pub poll_interval_secs: u64,
    pub ready_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:studio_desk.db".to_string(),
            api_key: None,
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: Some("http://localhost:8080".to_string()),
            documents_dir: default_documents_dir(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            max_document_bytes: 10 * 1024 * 1024,
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            automation_url: None,
            default_country_code: "55".to_string(),
            poll_interval_secs: 2,
            ready_timeout_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

impl WhatsAppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_documents_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("studio-desk").join("documents"))
        .unwrap_or_else(|| PathBuf::from("documents"))
}

impl AppConfig {
    /// Load the YAML file (if any) and apply overrides from `lookup`.
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn load<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_yaml_file(&path)?
        } else {
            debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(key) = lookup("API_KEY") {
            self.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.cors_origin = Some(origin).filter(|o| !o.trim().is_empty());
        }
        if let Some(dir) = lookup("DOCUMENTS_DIR") {
            self.documents_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("PUBLIC_BASE_URL") {
            self.public_base_url = url;
        }
        if let Some(url) = lookup("WHATSAPP_AUTOMATION_URL") {
            self.whatsapp.automation_url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(map: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let mut env = HashMap::new();
        env.insert(CONFIG_PATH_VAR, "/nonexistent/studio_desk.yaml".to_string());

        let config = AppConfig::load(lookup_from(env)).unwrap();
        assert_eq!(config.database_url, "sqlite:studio_desk.db");
        assert_eq!(config.whatsapp.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.whatsapp.ready_timeout(), Duration::from_secs(60));
        assert_eq!(config.whatsapp.default_country_code, "55");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_yaml_file_then_env_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "database_url: \"sqlite:from_file.db\"\nbind_address: \"0.0.0.0:4000\"\nwhatsapp:\n  automation_url: \"http://127.0.0.1:3001\"\n",
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert(CONFIG_PATH_VAR, path.to_string_lossy().to_string());
        env.insert("BIND_ADDRESS", "0.0.0.0:5000".to_string());
        env.insert("API_KEY", "secret".to_string());

        let config = AppConfig::load(lookup_from(env)).unwrap();
        assert_eq!(config.database_url, "sqlite:from_file.db");
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(
            config.whatsapp.automation_url.as_deref(),
            Some("http://127.0.0.1:3001")
        );
        // untouched nested defaults survive a partial file
        assert_eq!(config.whatsapp.poll_interval_secs, 2);
    }

    #[test]
    fn test_empty_automation_url_disables_integration() {
        let mut env = HashMap::new();
        env.insert(CONFIG_PATH_VAR, "/nonexistent.yaml".to_string());
        env.insert("WHATSAPP_AUTOMATION_URL", "  ".to_string());

        let config = AppConfig::load(lookup_from(env)).unwrap();
        assert!(config.whatsapp.automation_url.is_none());
    }
}
