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
    /// Public base URL of the frontend, used in sitemap entries and
    /// email links.
    pub frontend_host: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free pool connection before failing the
    /// request.
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    /// Lifetime of activation and password-reset tokens.
    pub email_token_expire_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// When false (the default, and in tests) emails are logged
    /// instead of sent.
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "noreply@localhost".to_string(),
            from_name: "Blog".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    /// Root directory for uploaded files, served at `/uploads`.
    pub dir: String,
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
}

/// Optional first-superuser account created at startup if absent.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub first_superuser_name: Option<String>,
    pub first_superuser_email: Option<String>,
    pub first_superuser_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub email: EmailConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.frontend_host", "http://localhost:5173")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 8)?
            .set_default("auth.access_token_expire_minutes", 60 * 24 * 7)?
            .set_default("auth.email_token_expire_hours", 24)?
            .set_default("email.enabled", false)?
            .set_default("email.smtp_host", "localhost")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.smtp_username", "")?
            .set_default("email.smtp_password", "")?
            .set_default("email.from_address", "noreply@localhost")?
            .set_default("email.from_name", "Blog")?
            .set_default("uploads.dir", "./uploads")?
            .set_default("uploads.max_file_size", 5 * 1024 * 1024)?
            .set_default(
                "uploads.allowed_extensions",
                vec![".jpg", ".jpeg", ".png", ".gif", ".webp"],
            )?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., BLOG__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("BLOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
