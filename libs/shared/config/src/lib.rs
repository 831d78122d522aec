use std::env;
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub default_page_size: usize,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            default_page_size: parse_or_default("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
