//! Configuration vault – reads/writes `~/.kinclimb/config.toml`.
//!
//! The file holds a [`RigConfig`]; any field left out takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use kinclimb_types::{HeadingMode, KinError, RigConfig};
use tracing::warn;

/// Return the path to `~/.kinclimb/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".kinclimb").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<RigConfig>, KinError> {
    load_from(&config_path())
}

/// Load, apply environment overrides and validate the config at `path`.
pub(crate) fn load_from(path: &Path) -> Result<Option<RigConfig>, KinError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| KinError::Io(format!("Failed to read config at {}: {}", path.display(), e)))?;
    let mut cfg: RigConfig = toml::from_str(&raw)
        .map_err(|e| KinError::Serialization(format!("Failed to parse config: {}", e)))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `KINCLIMB_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `KINCLIMB_SURFACE_TAG` | `climb.surface_tag` |
/// | `KINCLIMB_HOLD_TIME` | `climb.required_hold_time` |
/// | `KINCLIMB_HEADING_MODE` | `gait.heading_mode` |
pub fn apply_env_overrides(cfg: &mut RigConfig) {
    apply_overrides_with(cfg, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`] with an explicit variable lookup.
/// Unparseable values are logged and ignored.
pub(crate) fn apply_overrides_with(cfg: &mut RigConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(tag) = lookup("KINCLIMB_SURFACE_TAG") {
        cfg.climb.surface_tag = tag;
    }
    if let Some(v) = lookup("KINCLIMB_HOLD_TIME") {
        match v.trim().parse::<f32>() {
            Ok(secs) => cfg.climb.required_hold_time = secs,
            Err(_) => warn!(value = %v, "Ignoring KINCLIMB_HOLD_TIME: not a number"),
        }
    }
    if let Some(v) = lookup("KINCLIMB_HEADING_MODE") {
        match parse_heading_mode(&v) {
            Some(mode) => cfg.gait.heading_mode = mode,
            None => warn!(value = %v, "Ignoring KINCLIMB_HEADING_MODE: unknown mode"),
        }
    }
}

fn parse_heading_mode(raw: &str) -> Option<HeadingMode> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "view_direction" | "view" => Some(HeadingMode::ViewDirection),
        "shoulders" => Some(HeadingMode::Shoulders),
        "body_forward" | "body" => Some(HeadingMode::BodyForward),
        _ => None,
    }
}

/// Save the config to disk, creating `~/.kinclimb/` if necessary.
pub fn save(cfg: &RigConfig) -> Result<(), KinError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &RigConfig, path: &Path) -> Result<(), KinError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| KinError::Io(format!("Failed to create config directory: {}", e)))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                KinError::Io(format!("Failed to set config directory permissions: {}", e))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| KinError::Serialization(format!("Failed to serialize config: {}", e)))?;
    // Owner-only file (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| {
                KinError::Io(format!("Failed to write config at {}: {}", path.display(), e))
            })?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| KinError::Io(format!("Failed to write config at {}: {}", path.display(), e)))?;
    Ok(())
}
