//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MAX_ZOOM;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("api_key") {
            config.provider.api_key = non_empty(v);
        }
        if let Some(v) = section.get("request_timeout") {
            let timeout: u64 = parse_number(
                "provider",
                "request_timeout",
                v,
                "must be a positive integer (seconds)",
            )?;
            if timeout == 0 {
                return Err(invalid(
                    "provider",
                    "request_timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
            config.provider.request_timeout = timeout;
        }
    }

    // [endpoints] section
    if let Some(section) = ini.section(Some("endpoints")) {
        let endpoints = &mut config.endpoints;
        for (key, field) in [
            ("metadata_url", &mut endpoints.metadata_url),
            ("photometa_url", &mut endpoints.photometa_url),
            ("tile_url", &mut endpoints.tile_url),
        ] {
            if let Some(v) = section.get(key) {
                let v = v.trim();
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid("endpoints", key, v, "must be an http(s) URL"));
                }
                *field = v.trim_end_matches('?').to_string();
            }
        }
        for (key, field) in [
            ("trusted_publisher", &mut endpoints.trusted_publisher),
            ("language", &mut endpoints.language),
            ("region", &mut endpoints.region),
        ] {
            if let Some(v) = section.get(key).and_then(non_empty) {
                *field = v;
            }
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory").and_then(non_empty) {
            config.cache.directory = expand_tilde(&v);
        }
    }

    // [panorama] section
    if let Some(section) = ini.section(Some("panorama")) {
        let zoom_reason = format!("must be an integer between 1 and {}", MAX_ZOOM);
        if let Some(v) = section.get("zoom") {
            let zoom: u8 = parse_number("panorama", "zoom", v, &zoom_reason)?;
            if !(1..=MAX_ZOOM).contains(&zoom) {
                return Err(invalid("panorama", "zoom", v, &zoom_reason));
            }
            config.panorama.zoom = zoom;
        }
        if let Some(v) = section.get("tile_size") {
            let size: u32 =
                parse_number("panorama", "tile_size", v, "must be a positive integer (pixels)")?;
            if size == 0 {
                return Err(invalid(
                    "panorama",
                    "tile_size",
                    v,
                    "must be a positive integer (pixels)",
                ));
            }
            config.panorama.tile_size = size;
        }
        if let Some(v) = section.get("min_tile_bytes") {
            config.panorama.min_tile_bytes = parse_number(
                "panorama",
                "min_tile_bytes",
                v,
                "must be a non-negative integer (bytes)",
            )?;
        }
        if let Some(v) = section.get("fallback_min_zoom") {
            if v.trim().is_empty() {
                config.panorama.fallback_min_zoom = None;
            } else {
                let zoom: u8 = parse_number("panorama", "fallback_min_zoom", v, &zoom_reason)?;
                if !(1..=MAX_ZOOM).contains(&zoom) {
                    return Err(invalid("panorama", "fallback_min_zoom", v, &zoom_reason));
                }
                config.panorama.fallback_min_zoom = Some(zoom);
            }
        }
    }

    if let Some(min) = config.panorama.fallback_min_zoom {
        if min > config.panorama.zoom {
            return Err(invalid(
                "panorama",
                "fallback_min_zoom",
                &min.to_string(),
                "must not exceed zoom",
            ));
        }
    }

    // [image] section
    if let Some(section) = ini.section(Some("image")) {
        if let Some(v) = section.get("width") {
            config.image.width = parse_dimension("width", v)?;
        }
        if let Some(v) = section.get("height") {
            config.image.height = parse_dimension("height", v)?;
        }
        if let Some(v) = section.get("fov") {
            let fov: f64 = parse_number("image", "fov", v, "must be a number between 0 and 180")?;
            if !(fov > 0.0 && fov < 180.0) {
                return Err(invalid("image", "fov", v, "must be a number between 0 and 180"));
            }
            config.image.fov = fov;
        }
        if let Some(v) = section.get("pitch") {
            let pitch: f64 =
                parse_number("image", "pitch", v, "must be a number between -90 and 90")?;
            if !(-90.0..=90.0).contains(&pitch) {
                return Err(invalid("image", "pitch", v, "must be a number between -90 and 90"));
            }
            config.image.pitch = pitch;
        }
        if let Some(v) = section.get("jpeg_quality") {
            let quality: u8 =
                parse_number("image", "jpeg_quality", v, "must be an integer between 1 and 100")?;
            if !(1..=100).contains(&quality) {
                return Err(invalid(
                    "image",
                    "jpeg_quality",
                    v,
                    "must be an integer between 1 and 100",
                ));
            }
            config.image.jpeg_quality = quality;
        }
    }

    // [batch] section
    if let Some(section) = ini.section(Some("batch")) {
        if let Some(v) = section.get("workers") {
            let workers: usize =
                parse_number("batch", "workers", v, "must be a positive integer")?;
            if workers == 0 {
                return Err(invalid("batch", "workers", v, "must be a positive integer"));
            }
            config.batch.workers = workers;
        }
        if let Some(v) = section.get("failure_log_limit") {
            config.batch.failure_log_limit = parse_number(
                "batch",
                "failure_log_limit",
                v,
                "must be a non-negative integer",
            )?;
        }
    }

    // [sources] section
    if let Some(section) = ini.section(Some("sources")) {
        if let Some(v) = section.get("targets_dir").and_then(non_empty) {
            config.sources.targets_dir = expand_tilde(&v);
        }
        if let Some(v) = section.get("locations_file") {
            config.sources.locations_file = non_empty(v).map(|p| expand_tilde(&p));
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file").and_then(non_empty) {
            config.logging.file = expand_tilde(&v);
        }
    }

    Ok(config)
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, ConfigFileError> {
    let n: u32 = parse_number("image", key, value, "must be a positive integer (pixels)")?;
    if n == 0 {
        return Err(invalid("image", key, value, "must be a positive integer (pixels)"));
    }
    Ok(n)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
