use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub tree: TreeConfig,
    pub submission: SubmissionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Falls back to DATABASE_URL when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Applied with SET LOCAL lock_timeout inside every tree transaction
    pub lock_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Which TreeStore implementation backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "postgres" | "pg" | "postgresql" => Some(StoreBackend::Postgres),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub backend: StoreBackend,
    pub log_mutations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub max_links: usize,
    pub honeypot_field: String,
    pub min_message_length: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            rate_limit_requests: 5,
            rate_limit_window_secs: 3600,
            max_links: 2,
            honeypot_field: "website".to_string(),
            min_message_length: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_LOCK_TIMEOUT_MS") {
            self.database.lock_timeout_ms = v.parse().unwrap_or(self.database.lock_timeout_ms);
        }

        // API overrides
        if let Some(port) = env::var("CONTENT_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Tree overrides
        if let Ok(v) = env::var("TREE_BACKEND") {
            self.tree.backend = StoreBackend::parse(&v).unwrap_or(self.tree.backend);
        }
        if let Ok(v) = env::var("TREE_LOG_MUTATIONS") {
            self.tree.log_mutations = v.parse().unwrap_or(self.tree.log_mutations);
        }

        // Submission overrides
        if let Ok(v) = env::var("SUBMISSION_RATE_LIMIT_REQUESTS") {
            self.submission.rate_limit_requests = v.parse().unwrap_or(self.submission.rate_limit_requests);
        }
        if let Ok(v) = env::var("SUBMISSION_RATE_LIMIT_WINDOW_SECS") {
            self.submission.rate_limit_window_secs = v.parse().unwrap_or(self.submission.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("SUBMISSION_MAX_LINKS") {
            self.submission.max_links = v.parse().unwrap_or(self.submission.max_links);
        }
        if let Ok(v) = env::var("SUBMISSION_HONEYPOT_FIELD") {
            self.submission.honeypot_field = v;
        }
        if let Ok(v) = env::var("SUBMISSION_MIN_MESSAGE_LENGTH") {
            self.submission.min_message_length = v.parse().unwrap_or(self.submission.min_message_length);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                lock_timeout_ms: 10_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            tree: TreeConfig {
                backend: StoreBackend::Memory,
                log_mutations: true,
            },
            submission: SubmissionConfig {
                rate_limit_requests: 100,
                ..SubmissionConfig::default()
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                lock_timeout_ms: 5_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            tree: TreeConfig {
                backend: StoreBackend::Postgres,
                log_mutations: true,
            },
            submission: SubmissionConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                lock_timeout_ms: 2_000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            tree: TreeConfig {
                backend: StoreBackend::Postgres,
                log_mutations: false,
            },
            submission: SubmissionConfig {
                rate_limit_requests: 3,
                ..SubmissionConfig::default()
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
