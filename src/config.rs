use serde::Deserialize;

pub const DEFAULT_AI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the external text-generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout_secs: u64,
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "taskpilot".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "taskpilot-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60 * 24),
        };
        let ai = AiConfig {
            api_key: std::env::var("AI_API_KEY").unwrap_or_default(),
            api_url: std::env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_AI_API_URL.into()),
            timeout_secs: env_parse("AI_TIMEOUT_SECS", 30),
            batch_delay_ms: env_parse("AI_BATCH_DELAY_MS", 100),
        };
        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            ai,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::env_parse;

    #[test]
    fn env_parse_falls_back_on_missing_or_garbage() {
        assert_eq!(env_parse("TASKPILOT_TEST_UNSET_VARIABLE", 42u64), 42);
        std::env::set_var("TASKPILOT_TEST_GARBAGE_VARIABLE", "not-a-number");
        assert_eq!(env_parse("TASKPILOT_TEST_GARBAGE_VARIABLE", 7i64), 7);
        std::env::set_var("TASKPILOT_TEST_NUMBER_VARIABLE", "15");
        assert_eq!(env_parse("TASKPILOT_TEST_NUMBER_VARIABLE", 7i64), 15);
    }
}
