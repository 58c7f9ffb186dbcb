use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Take the client address from `X-Forwarded-For` (behind a proxy).
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Empty outside production selects the in-memory row store.
    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_true")]
    pub run_migrations: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub contact_relay_url: Option<String>,

    #[serde(default = "default_contact_limit")]
    pub contact_limit_per_hour: u64,

    #[serde(default = "default_leetcode_api_url")]
    pub leetcode_api_url: String,

    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_github_username")]
    pub default_github_username: String,

    #[serde(default = "default_leetcode_username")]
    pub default_leetcode_username: String,

    #[serde(default = "default_hackerrank_username")]
    pub default_hackerrank_username: String,

    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Site".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_expiration() -> i64 {
    60
}
fn default_cache_ttl() -> u64 {
    300
}
fn default_contact_limit() -> u64 {
    2
}
fn default_leetcode_api_url() -> String {
    "https://leetcode-stats-api.herokuapp.com".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_http_timeout() -> u64 {
    10
}
fn default_github_username() -> String {
    "octocat".to_string()
}
fn default_leetcode_username() -> String {
    "leetcode".to_string()
}
fn default_hackerrank_username() -> String {
    "hackerrank".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            trust_forwarded_for: false,
            database_url: String::new(),
            run_migrations: default_true(),
            cors_allowed_origins: default_cors_origins(),
            jwt_secret: String::new(),
            jwt_expiration_minutes: default_jwt_expiration(),
            cache_ttl_secs: default_cache_ttl(),
            contact_relay_url: None,
            contact_limit_per_hour: default_contact_limit(),
            leetcode_api_url: default_leetcode_api_url(),
            github_api_url: default_github_api_url(),
            http_timeout_secs: default_http_timeout(),
            default_github_username: default_github_username(),
            default_leetcode_username: default_leetcode_username(),
            default_hackerrank_username: default_hackerrank_username(),
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Inject critical env values if missing
        config.jwt_secret = fill_or_env(config.jwt_secret, "APP_JWT_SECRET")?;
        if config.database_url.trim().is_empty() {
            config.database_url = env::var("APP_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .unwrap_or_default();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.is_production() && self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty in production");
        }
        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters");
        }
        if self.jwt_expiration_minutes <= 0 {
            errors.push("JWT_EXPIRATION_MINUTES must be positive");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if self.admin_email.is_some() != self.admin_password.is_some() {
            errors.push("ADMIN_EMAIL and ADMIN_PASSWORD must be set together");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.trim().is_empty()
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &if self.uses_memory_store() { "[MEMORY]" } else { "[REDACTED]" })
            .field("run_migrations", &self.run_migrations)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("contact_relay_url", &self.contact_relay_url)
            .field("contact_limit_per_hour", &self.contact_limit_per_hour)
            .field("leetcode_api_url", &self.leetcode_api_url)
            .field("github_api_url", &self.github_api_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            jwt_secret: "a".repeat(40),
            ..AppConfig::default()
        }
    }

    #[test]
    fn accepts_memory_store_outside_production() {
        assert!(valid().validate().is_ok());
        assert!(valid().uses_memory_store());
    }

    #[test]
    fn rejects_short_secret_and_wildcard_cors_in_production() {
        let config = AppConfig {
            env: AppEnvironment::Production,
            database_url: "postgres://localhost/site".into(),
            jwt_secret: "short".into(),
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("JWT_SECRET"));
        assert!(err.contains("Wildcard CORS"));
    }

    #[test]
    fn admin_credentials_come_in_pairs() {
        let config = AppConfig {
            admin_email: Some("admin@example.com".into()),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig {
            admin_email: Some("admin@example.com".into()),
            admin_password: Some("Sup3r$ecretPassword!".into()),
            ..valid()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("Sup3r$ecretPassword!"));
        assert!(!printed.contains(&"a".repeat(40)));
    }

    #[test]
    fn splits_comma_separated_origins() {
        let config = AppConfig {
            cors_allowed_origins: vec!["https://a.dev, https://b.dev".into()],
            ..valid()
        };
        assert_eq!(config.cors_origins(), vec!["https://a.dev", "https://b.dev"]);
    }
}
