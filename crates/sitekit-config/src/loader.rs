//! Raw configuration loading and CLI overrides.
//!
//! Produces the untyped [`RawValue`] the schemas consume. Nothing here validates.

use std::path::Path;

use crate::{
    config::ServerHost,
    error::{ConfigError, Result},
    value::RawValue,
};

/// Load a config file into a raw value. The format is picked by extension
/// (`.toml`, `.json`, `.yaml`/`.yml`).
pub fn load_raw(path: &Path) -> Result<RawValue> {
    if !path.exists() {
        return Err(ConfigError::load(path, "file not found"));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::load_with_source(path, "failed to read file", e))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let value: serde_json::Value = match ext {
        "toml" => toml::from_str(&content)?,
        "json" => serde_json::from_str(&content)?,
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        other => {
            return Err(ConfigError::load(
                path,
                format!("unsupported config format '.{other}'"),
            ));
        }
    };

    tracing::debug!(path = %path.display(), "Loaded raw configuration");
    Ok(value.into())
}

/// Deep-merge `overlay` into `base`. Objects merge key by key; anything else in
/// `overlay` replaces the value in `base`.
pub fn merge(base: &mut RawValue, overlay: RawValue) {
    match (base, overlay) {
        (RawValue::Object(base), RawValue::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(RawValue::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Overrides collected from command-line flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliFlags {
    pub root: Option<String>,
    pub site: Option<String>,
    pub base: Option<String>,
    pub port: Option<u16>,
    pub host: Option<ServerHost>,
}

/// Merge CLI flags into a raw config.
///
/// When `server` is a function its result is unknown until the command is, so
/// `port`/`host` are attached to the function as side attributes instead.
pub fn apply_cli_flags(raw: &mut RawValue, flags: &CliFlags) {
    if raw.is_null() {
        *raw = RawValue::empty_object();
    }
    let Some(map) = raw.as_object_mut() else {
        return;
    };

    for (key, value) in [("root", &flags.root), ("site", &flags.site), ("base", &flags.base)] {
        if let Some(value) = value {
            map.insert(key.to_string(), RawValue::from(value.as_str()));
        }
    }

    let server_flags: Vec<(&str, RawValue)> = [
        flags.port.map(|port| ("port", RawValue::from(port))),
        flags.host.as_ref().map(|host| ("host", host_value(host))),
    ]
    .into_iter()
    .flatten()
    .collect();
    if server_flags.is_empty() {
        return;
    }

    let server = map
        .entry("server".to_string())
        .or_insert_with(RawValue::empty_object);
    match server {
        RawValue::Function(func) => {
            for (key, value) in server_flags {
                func.set_attr(key, value);
            }
        }
        RawValue::Object(server) => {
            for (key, value) in server_flags {
                server.insert(key.to_string(), value);
            }
        }
        // Left for validation to report.
        _ => {}
    }
}

fn host_value(host: &ServerHost) -> RawValue {
    match host {
        ServerHost::Enabled(enabled) => RawValue::from(*enabled),
        ServerHost::Address(address) => RawValue::from(address.as_str()),
    }
}
