use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_exp_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the media store, served at `/public`.
    pub root_dir: String,
    /// URL prefix prepended to stored file paths in API responses.
    pub cdn_url: String,
    /// Avatar URL returned for users without an uploaded avatar.
    pub default_avatar: String,
    /// Maximum size in bytes of a single uploaded file.
    pub max_file_size: u64,
    /// Maximum number of preview images per rice.
    pub max_previews: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ModerationConfig {
    /// Words rejected in usernames, display names, titles and descriptions.
    pub blacklisted_words: Vec<String>,
    /// Comments/reports allowed per user per minute. 0 disables the limit.
    pub writes_per_minute: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_exp_hours", 168)?
            .set_default("storage.root_dir", "./public")?
            .set_default("storage.cdn_url", "http://localhost:3000/public/")?
            .set_default("storage.default_avatar", "avatars/default.png")?
            .set_default("storage.max_file_size", 20 * 1024 * 1024)?
            .set_default("storage.max_previews", 5)?
            .set_default("moderation.blacklisted_words", Vec::<String>::new())?
            .set_default("moderation.writes_per_minute", 10)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., RICEHUB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("RICEHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
