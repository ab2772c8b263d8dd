//! PostCSS configuration lookup.
//!
//! Inline options win. Without them the resolver searches for a PostCSS config file
//! from the project root upwards, the same places `postcss-load-config` looks. Only
//! declarative formats can be read; script configs are reported as errors.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::{
    config::PostcssConfig,
    error::{ConfigError, Result},
    schema,
    value::{RawMap, RawValue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// `package.json` with a `postcss` key.
    PackageJson,
    Json,
    /// YAML, which also covers JSON written to an extensionless rc file.
    Yaml,
    Script,
}

const CANDIDATES: &[(&str, Format)] = &[
    ("package.json", Format::PackageJson),
    (".postcssrc", Format::Yaml),
    (".postcssrc.json", Format::Json),
    (".postcssrc.yaml", Format::Yaml),
    (".postcssrc.yml", Format::Yaml),
    (".postcssrc.js", Format::Script),
    (".postcssrc.cjs", Format::Script),
    (".postcssrc.mjs", Format::Script),
    ("postcss.config.js", Format::Script),
    ("postcss.config.cjs", Format::Script),
    ("postcss.config.mjs", Format::Script),
];

/// Resolve PostCSS `options` and `plugins` for a project.
///
/// `inline` is the raw `style.postcss` value:
/// - an object is split into its `plugins` list and the remaining options, without
///   touching the file system;
/// - an array is treated as an object keyed by index;
/// - a string searches from that path, relative to `root`;
/// - anything else searches from `root`.
///
/// A missing config file is not an error and yields empty options and plugins.
pub async fn resolve_postcss_config(inline: Option<&RawValue>, root: &Url) -> Result<PostcssConfig> {
    let value = resolve_postcss_value(inline, root).await?;
    Ok(schema::validate_postcss(&value)?)
}

/// Resolve `style.postcss` into a raw `{ options, plugins }` object.
pub(crate) async fn resolve_postcss_value(inline: Option<&RawValue>, root: &Url) -> Result<RawValue> {
    match inline {
        Some(RawValue::Object(map)) => Ok(split_inline(map)),
        Some(RawValue::Array(items)) => {
            let map: RawMap = items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect();
            Ok(split_inline(&map))
        }
        Some(RawValue::String(search_path)) => {
            search_config(&root_dir(root)?.join(search_path)).await
        }
        _ => search_config(&root_dir(root)?).await,
    }
}

fn split_inline(inline: &RawMap) -> RawValue {
    let mut options = inline.clone();
    let plugins = options
        .remove("plugins")
        .filter(RawValue::is_truthy)
        .unwrap_or_else(|| RawValue::array([]));

    RawValue::object([("options", RawValue::Object(options)), ("plugins", plugins)])
}

fn root_dir(root: &Url) -> Result<PathBuf> {
    root.to_file_path()
        .map_err(|()| ConfigError::InvalidRoot(format!("{root} is not a local directory")))
}

fn empty_config() -> RawValue {
    RawValue::object([
        ("options", RawValue::empty_object()),
        ("plugins", RawValue::array([])),
    ])
}

async fn search_config(start: &Path) -> Result<RawValue> {
    let start = match tokio::fs::metadata(start).await {
        Ok(meta) if meta.is_file() => start.parent().unwrap_or(start),
        _ => start,
    };

    for dir in start.ancestors() {
        for (name, format) in CANDIDATES {
            let path = dir.join(name);
            let exists = tokio::fs::try_exists(&path).await.map_err(|e| {
                ConfigError::resolution_with_source(&path, "failed to access file", e)
            })?;
            if !exists {
                continue;
            }

            if let Some(config) = read_config(&path, *format).await? {
                debug!(path = %path.display(), "Loaded PostCSS config");
                return normalize(config, &path);
            }
        }
    }

    debug!(start = %start.display(), "No PostCSS config found");
    Ok(empty_config())
}

/// Read one candidate file. `None` means the file does not hold a PostCSS config.
async fn read_config(path: &Path, format: Format) -> Result<Option<serde_json::Value>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::resolution_with_source(path, "failed to read file", e))?;
    if content.trim().is_empty() {
        debug!(path = %path.display(), "Skipping empty PostCSS config");
        return Ok(None);
    }

    let parsed: serde_json::Value = match format {
        Format::PackageJson | Format::Json => serde_json::from_str(&content)
            .map_err(|e| ConfigError::resolution_with_source(path, "invalid JSON", e))?,
        Format::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::resolution_with_source(path, "invalid YAML", e))?,
        Format::Script => {
            return Err(ConfigError::resolution(
                path,
                "script configs cannot be evaluated; use .postcssrc.json or .postcssrc.yaml",
            ));
        }
    };

    if format == Format::PackageJson {
        return Ok(parsed.get("postcss").cloned());
    }
    Ok(Some(parsed))
}

/// Turn a config file's contents into `{ options, plugins }`.
///
/// Plugins may be a list or a `{ name: options }` map; map entries set to `false` are
/// disabled. Map entries become `[name, options]` pairs in file order.
fn normalize(config: serde_json::Value, path: &Path) -> Result<RawValue> {
    use serde_json::Value as J;

    let mut options = match config {
        J::Object(map) => map,
        J::Null => return Ok(empty_config()),
        other => {
            return Err(ConfigError::resolution(
                path,
                format!("expected an object, found {}", RawValue::from(other).type_name()),
            ));
        }
    };

    let plugins: Vec<RawValue> = match options.shift_remove("plugins") {
        None | Some(J::Null) => Vec::new(),
        Some(J::Array(items)) => items
            .into_iter()
            .map(RawValue::from)
            .filter(RawValue::is_truthy)
            .collect(),
        Some(J::Object(map)) => map
            .into_iter()
            .filter(|(_, opts)| *opts != J::Bool(false))
            .map(|(name, opts)| RawValue::array([RawValue::from(name), RawValue::from(opts)]))
            .collect(),
        Some(other) => {
            return Err(ConfigError::resolution(
                path,
                format!(
                    "plugins must be an array or object, found {}",
                    RawValue::from(other).type_name()
                ),
            ));
        }
    };

    Ok(RawValue::object([
        ("options", RawValue::from(J::Object(options))),
        ("plugins", RawValue::Array(plugins)),
    ]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dir_url(path: &Path) -> Url {
        Url::from_directory_path(path).expect("absolute path")
    }

    #[tokio::test]
    async fn test_inline_object_skips_search() {
        // Not a file URL: any file system search would fail.
        let root = Url::parse("https://example.com/").expect("url");
        let inline = RawValue::object([
            (
                "plugins",
                RawValue::array([RawValue::from("p1"), RawValue::from("p2")]),
            ),
            ("foo", RawValue::from(json!(1))),
        ]);

        let config = resolve_postcss_config(Some(&inline), &root)
            .await
            .expect("resolve");
        assert_eq!(config.options, RawValue::from(json!({ "foo": 1 })));
        assert_eq!(config.plugins, vec![RawValue::from("p1"), RawValue::from("p2")]);
    }

    #[tokio::test]
    async fn test_inline_without_plugins() {
        let root = Url::parse("https://example.com/").expect("url");
        let inline = RawValue::from(json!({ "map": false, "plugins": null }));

        let config = resolve_postcss_config(Some(&inline), &root)
            .await
            .expect("resolve");
        assert_eq!(config.options, RawValue::from(json!({ "map": false })));
        assert!(config.plugins.is_empty());
    }

    #[tokio::test]
    async fn test_missing_config_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let config = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .expect("resolve");
        assert_eq!(config, PostcssConfig::default());
    }

    #[tokio::test]
    async fn test_json_rc_with_plugin_map() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(
            dir.path().join(".postcssrc.json"),
            r#"{ "map": true, "plugins": { "zeta": {}, "alpha": { "stage": 3 }, "off": false } }"#,
        )
        .expect("write");

        let config = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .expect("resolve");
        assert_eq!(config.options, RawValue::from(json!({ "map": true })));
        assert_eq!(
            config.plugins,
            vec![
                RawValue::from(json!(["zeta", {}])),
                RawValue::from(json!(["alpha", { "stage": 3 }])),
            ]
        );
    }

    #[tokio::test]
    async fn test_yaml_rc_in_parent_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let site = dir.path().join("site");
        std::fs::create_dir(&site).expect("mkdir");
        std::fs::write(
            dir.path().join(".postcssrc.yaml"),
            "plugins:\n  - autoprefixer\nparser: sugarss\n",
        )
        .expect("write");

        let config = resolve_postcss_config(None, &dir_url(&site))
            .await
            .expect("resolve");
        assert_eq!(config.options, RawValue::from(json!({ "parser": "sugarss" })));
        assert_eq!(config.plugins, vec![RawValue::from("autoprefixer")]);
    }

    #[tokio::test]
    async fn test_package_json_needs_postcss_key() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("package.json"), r#"{ "name": "site" }"#).expect("write");
        std::fs::write(dir.path().join(".postcssrc"), r#"{ "plugins": ["nesting"] }"#)
            .expect("write");

        let config = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .expect("resolve");
        assert_eq!(config.plugins, vec![RawValue::from("nesting")]);

        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "site", "postcss": { "plugins": ["from-package"] } }"#,
        )
        .expect("write");
        let config = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .expect("resolve");
        assert_eq!(config.plugins, vec![RawValue::from("from-package")]);
    }

    #[tokio::test]
    async fn test_search_path_string() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let styles = dir.path().join("styles");
        std::fs::create_dir(&styles).expect("mkdir");
        std::fs::write(styles.join(".postcssrc.json"), r#"{ "plugins": ["cssnano"] }"#)
            .expect("write");

        let inline = RawValue::from("styles");
        let config = resolve_postcss_config(Some(&inline), &dir_url(dir.path()))
            .await
            .expect("resolve");
        assert_eq!(config.plugins, vec![RawValue::from("cssnano")]);
    }

    #[tokio::test]
    async fn test_malformed_config_is_fatal() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join(".postcssrc.json"), "{ plugins: ").expect("write");

        let err = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Resolution { .. }));
        assert!(err.to_string().contains(".postcssrc.json"));
    }

    #[tokio::test]
    async fn test_script_config_is_fatal() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("postcss.config.cjs"), "module.exports = {}")
            .expect("write");

        let err = resolve_postcss_config(None, &dir_url(dir.path()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("script configs cannot be evaluated"));
    }

    #[tokio::test]
    async fn test_non_object_inline_searches_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join(".postcssrc.json"), r#"{ "plugins": ["nesting"] }"#)
            .expect("write");
        let root = dir_url(dir.path());

        for inline in [RawValue::from(true), RawValue::from(json!(5))] {
            let config = resolve_postcss_config(Some(&inline), &root)
                .await
                .expect("resolve");
            assert_eq!(config.plugins, vec![RawValue::from("nesting")]);
        }
    }

    #[tokio::test]
    async fn test_inline_array_is_split_like_object() {
        let root = Url::parse("https://example.com/").expect("url");
        let inline = RawValue::from(json!(["a", "b"]));

        let config = resolve_postcss_config(Some(&inline), &root)
            .await
            .expect("resolve");
        assert_eq!(config.options, RawValue::from(json!({ "0": "a", "1": "b" })));
        assert!(config.plugins.is_empty());
    }

    #[tokio::test]
    async fn test_empty_config_file_is_skipped() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let site = dir.path().join("site");
        std::fs::create_dir(&site).expect("mkdir");
        std::fs::write(site.join(".postcssrc.json"), "  \n").expect("write");
        std::fs::write(dir.path().join(".postcssrc.json"), r#"{ "plugins": ["outer"] }"#)
            .expect("write");

        let config = resolve_postcss_config(None, &dir_url(&site))
            .await
            .expect("resolve");
        assert_eq!(config.plugins, vec![RawValue::from("outer")]);
    }

    #[tokio::test]
    async fn test_non_file_root_cannot_be_searched() {
        let root = Url::parse("https://example.com/").expect("url");
        let err = resolve_postcss_config(None, &root).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(_)));
    }
}
