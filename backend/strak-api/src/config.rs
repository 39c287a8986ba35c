/// Configuration management for the Strak API
///
/// Everything is read from environment variables (optionally seeded from a
/// `.env` file by `main`). Invalid values fail startup instead of silently
/// falling back.
use db_pool::{parse_env_optional, parse_env_with_default, DbConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SERVICE_NAME: &str = "strak-api";

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DbConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// development, staging, production
    pub env: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `None` disables caching entirely
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key_pem", &"[REDACTED]")
            .field("public_key_pem", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub max_bytes: usize,
    /// Prefix used to build public media URLs
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let app = AppConfig {
            env,
            host: std::env::var("STRAK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_strict("STRAK_PORT", 8080)?,
            workers: parse_strict("HTTP_WORKERS", 4)?,
            run_migrations: parse_strict("RUN_MIGRATIONS", true)?,
        };

        let cors = CorsConfig {
            allowed_origins: parse_origins(
                std::env::var("CORS_ALLOWED_ORIGINS").ok().as_deref(),
                app.is_production(),
            )?,
        };

        let database = DbConfig::from_env(SERVICE_NAME)?;

        let cache = CacheConfig {
            redis_url: std::env::var("REDIS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            ttl_secs: parse_strict("CACHE_TTL_SECS", 300)?,
        };
        if cache.ttl_secs == 0 {
            return Err("CACHE_TTL_SECS must be greater than zero".to_string());
        }

        let jwt = JwtConfig {
            private_key_pem: read_pem("JWT_PRIVATE_KEY_PEM")?,
            public_key_pem: read_pem("JWT_PUBLIC_KEY_PEM")?,
        };

        let media = MediaConfig {
            root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
            max_bytes: parse_strict("MEDIA_MAX_BYTES", 5 * 1024 * 1024)?,
            public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "/api/v1/media".to_string()),
        };
        if media.max_bytes == 0 {
            return Err("MEDIA_MAX_BYTES must be greater than zero".to_string());
        }

        Ok(Config {
            app,
            cors,
            database,
            cache,
            jwt,
            media,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

/// Like `parse_env_with_default`, but a present-yet-unparsable value is an error.
fn parse_strict<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_env_optional(key)
            .ok_or_else(|| format!("Failed to parse {key}='{raw}'")),
        _ => Ok(parse_env_with_default(key, default)),
    }
}

/// PEM values may be given inline with literal `\n` escapes.
fn read_pem(key: &str) -> Result<String, String> {
    let raw = std::env::var(key).map_err(|_| format!("{key} must be set"))?;
    Ok(raw.replace("\\n", "\n"))
}

fn parse_origins(raw: Option<&str>, production: bool) -> Result<Vec<String>, String> {
    let raw = match raw {
        Some(value) if !value.trim().is_empty() => value,
        _ if production => {
            return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
        }
        _ => "http://localhost:5173",
    };

    let origins: Vec<String> = raw
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    if production && origins.iter().any(|origin| origin == "*") {
        return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
    }

    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_default_in_development() {
        let origins = parse_origins(None, false).unwrap();
        assert_eq!(origins, vec!["http://localhost:5173".to_string()]);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins(Some(" https://a.example , https://b.example,"), true).unwrap();
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn production_requires_explicit_origins() {
        assert!(parse_origins(None, true).is_err());
        assert!(parse_origins(Some("*"), true).is_err());
        assert!(parse_origins(Some("*"), false).is_ok());
    }

    #[test]
    #[serial_test::serial]
    fn strict_parse_rejects_garbage() {
        std::env::set_var("STRAK_TEST_WORKERS", "many");
        assert!(parse_strict::<usize>("STRAK_TEST_WORKERS", 4).is_err());

        std::env::set_var("STRAK_TEST_WORKERS", "8");
        assert_eq!(parse_strict::<usize>("STRAK_TEST_WORKERS", 4), Ok(8));

        std::env::remove_var("STRAK_TEST_WORKERS");
        assert_eq!(parse_strict::<usize>("STRAK_TEST_WORKERS", 4), Ok(4));
    }

    #[test]
    #[serial_test::serial]
    fn pem_escapes_are_expanded() {
        std::env::set_var("STRAK_TEST_PEM", "-----BEGIN-----\\nabc\\n-----END-----");
        assert_eq!(
            read_pem("STRAK_TEST_PEM").unwrap(),
            "-----BEGIN-----\nabc\n-----END-----"
        );
        std::env::remove_var("STRAK_TEST_PEM");
    }

    #[test]
    #[serial_test::serial]
    fn zero_cache_ttl_is_rejected() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/strak");
        std::env::set_var("JWT_PRIVATE_KEY_PEM", "private");
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "public");

        std::env::set_var("CACHE_TTL_SECS", "0");
        let err = Config::from_env().unwrap_err();
        assert!(err.contains("CACHE_TTL_SECS"), "{err}");

        std::env::set_var("CACHE_TTL_SECS", "60");
        assert_eq!(Config::from_env().unwrap().cache.ttl_secs, 60);

        for key in [
            "DATABASE_URL",
            "JWT_PRIVATE_KEY_PEM",
            "JWT_PUBLIC_KEY_PEM",
            "CACHE_TTL_SECS",
        ] {
            std::env::remove_var(key);
        }
    }
}
