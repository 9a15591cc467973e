use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub imgbb_url: String,
    pub imgbb_key: Option<String>,
    pub max_photo_bytes: usize,
    pub bootstrap_admin: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            imgbb_url: try_load("IMGBB_URL", "https://api.imgbb.com/1/upload"),
            imgbb_key: read_secret("IMGBB_API_KEY"),
            max_photo_bytes: try_load("MAX_PHOTO_BYTES", &DEFAULT_MAX_PHOTO_BYTES.to_string()),
            bootstrap_admin: try_load("BOOTSTRAP_ADMIN", "Admin"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            imgbb_url: "https://api.imgbb.com/1/upload".to_string(),
            imgbb_key: None,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
            bootstrap_admin: "Admin".to_string(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Docker secret first, then the environment. Photo uploads are disabled when
/// neither is present.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("Failed to read {secret_name} from file: {e}");
        })
        .or_else(|_| var(secret_name))
        .map_err(|_| {
            warn!("{secret_name} missing, photo uploads disabled");
        })
        .ok()
        .filter(|s| !s.is_empty())
}
