use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Discord application
    pub discord_bot_token: String,
    pub discord_application_id: String,
    pub discord_public_key: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Scanning
    pub scan_interval_minutes: u64,

    // Admin
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            discord_bot_token: required_env("DISCORD_BOT_TOKEN"),
            discord_application_id: required_env("DISCORD_APPLICATION_ID"),
            discord_public_key: required_env("DISCORD_PUBLIC_KEY"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            scan_interval_minutes: env::var("SCAN_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("SCAN_INTERVAL_MINUTES must be a number"),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: required_env("ADMIN_PASSWORD"),
        }
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        tracing::info!(
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            scan_interval_minutes = self.scan_interval_minutes,
            application_id = self.discord_application_id.as_str(),
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
