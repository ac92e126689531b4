use dirs::data_dir;
use log::warn;
use once_cell::sync::Lazy;
use std::{fs, path::PathBuf};

pub const APP_DIR: &str = "dev-event-hub";
pub const DB_PATH_ENV: &str = "DEV_EVENT_HUB_DB";
pub const FEATURED_LIMIT_ENV: &str = "DEV_EVENT_HUB_FEATURED_LIMIT";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = base.join(APP_DIR);
    if let Err(err) = fs::create_dir_all(&root) {
        warn!("failed to create data root {:?}: {err}", root);
    }
    root
});

fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

/// Database location: `DEV_EVENT_HUB_DB` when set, else the data root.
pub fn database_path() -> PathBuf {
    match std::env::var(DB_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => data_root().join("events.sqlite"),
    }
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}
