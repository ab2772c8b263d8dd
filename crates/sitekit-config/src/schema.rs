//! Base configuration schema.
//!
//! Validation runs in two steps. [`preprocess`] rewrites the raw tree where the
//! user may supply a shortcut (nested integration lists, a `server` function).
//! [`validate`] then walks every known field, filling defaults and collecting one
//! [`Issue`] per invalid field. Nothing is reported until the whole object has been
//! visited.
//!
//! Locations stay as the user wrote them; [`crate::relative`] resolves them.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::{
    config::{
        BuildConfig, BuildFormat, Config, Integration, LegacyConfig, MarkdownConfig, OutputMode,
        PluginEntry, PluginRef, PostcssConfig, ServerConfig, ServerHost, ShikiConfig, ShikiTheme,
        StyleConfig, SyntaxHighlight, TrailingSlash,
    },
    defaults,
    error::{Issue, ValidationFailure},
    path::append_forward_slash,
    value::{RawMap, RawValue},
};

const KNOWN_KEYS: &[&str] = &[
    "root",
    "srcDir",
    "publicDir",
    "outDir",
    "site",
    "base",
    "trailingSlash",
    "output",
    "adapter",
    "integrations",
    "build",
    "server",
    "style",
    "markdown",
    "vite",
    "legacy",
    "experimentalErrorOverlay",
];

/// Preprocess and validate a raw configuration without a project root.
///
/// A `server` function receives a placeholder command; use
/// [`crate::RelativeSchema`] when the command is known.
pub fn parse(raw: &RawValue) -> Result<Config<String>, ValidationFailure> {
    let prepared = preprocess(raw.clone(), defaults::PLACEHOLDER_COMMAND, false);
    validate(&prepared)
}

/// Apply the shortcuts the raw config may use.
///
/// - `integrations` is flattened and falsy entries dropped.
/// - A callable `server` is invoked with `{ command }`. With `revive_overrides`, truthy
///   `port`/`host` side attributes on the callable are written onto its result.
pub fn preprocess(mut raw: RawValue, server_command: &str, revive_overrides: bool) -> RawValue {
    if let Some(map) = raw.as_object_mut() {
        flatten_integrations(map);
        resolve_server(map, server_command, revive_overrides);
    }
    raw
}

fn flatten_integrations(config: &mut RawMap) {
    if let Some(value) = config.get_mut("integrations") {
        *value = std::mem::take(value).flatten_truthy();
    }
}

fn resolve_server(config: &mut RawMap, command: &str, revive_overrides: bool) {
    let Some(func) = config
        .get("server")
        .and_then(RawValue::as_callable)
        .cloned()
    else {
        return;
    };

    let mut result = func.call(&RawValue::object([("command", RawValue::from(command))]));
    // A function that returns nothing means "use the defaults".
    if result.is_null() {
        result = RawValue::empty_object();
    }

    if revive_overrides {
        if let Some(map) = result.as_object_mut() {
            for key in ["port", "host"] {
                if let Some(value) = func.attr(key).filter(|v| v.is_truthy()) {
                    debug!(key, value = %value.summary(), "Applying CLI override to server result");
                    map.insert(key.to_string(), value.clone());
                }
            }
        }
    }

    debug!(command, "Resolved server config from function");
    config.insert("server".to_string(), result);
}

/// Validate a preprocessed raw configuration.
pub fn validate(raw: &RawValue) -> Result<Config<String>, ValidationFailure> {
    let mut v = Validator::default();
    let root = FieldPath::root();

    let Some(map) = raw.as_object() else {
        v.report(&root, "object", raw);
        return Err(ValidationFailure::new(v.issues));
    };

    for key in map.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        debug!(key, "Ignoring unknown configuration key");
    }

    let config = Config {
        root: v.string(map.get("root"), &root.key("root"), defaults::ROOT),
        src_dir: v.string(map.get("srcDir"), &root.key("srcDir"), defaults::SRC_DIR),
        public_dir: v.string(map.get("publicDir"), &root.key("publicDir"), defaults::PUBLIC_DIR),
        out_dir: v.string(map.get("outDir"), &root.key("outDir"), defaults::OUT_DIR),
        site: v.site(map.get("site"), &root.key("site")),
        base: v.string(map.get("base"), &root.key("base"), defaults::BASE),
        trailing_slash: v.choice(
            map.get("trailingSlash"),
            &root.key("trailingSlash"),
            &[
                ("always", TrailingSlash::Always),
                ("never", TrailingSlash::Never),
                ("ignore", TrailingSlash::Ignore),
            ],
            TrailingSlash::default(),
        ),
        output: v.choice(
            map.get("output"),
            &root.key("output"),
            &[("static", OutputMode::Static), ("server", OutputMode::Server)],
            OutputMode::default(),
        ),
        adapter: map
            .get("adapter")
            .and_then(|value| v.integration(value, &root.key("adapter"))),
        integrations: v.integrations(map.get("integrations"), &root.key("integrations")),
        build: v.build(map.get("build"), &root.key("build")),
        server: v.server(map.get("server"), &root.key("server")),
        style: v.style(map.get("style"), &root.key("style")),
        markdown: v.markdown(map.get("markdown"), &root.key("markdown")),
        vite: v.open_object(map.get("vite"), &root.key("vite")),
        legacy: v.legacy(map.get("legacy"), &root.key("legacy")),
        experimental_error_overlay: v.boolean(
            map.get("experimentalErrorOverlay"),
            &root.key("experimentalErrorOverlay"),
            false,
        ),
    };

    v.finish(config)
}

/// Validate a resolved `style.postcss` value on its own.
pub(crate) fn validate_postcss(value: &RawValue) -> Result<PostcssConfig, ValidationFailure> {
    let mut v = Validator::default();
    let path = FieldPath::root().key("style").key("postcss");
    let config = match value {
        RawValue::Object(_) => v.postcss(Some(value), &path),
        other => {
            v.report(&path, "object", other);
            PostcssConfig::default()
        }
    };
    v.finish(config)
}

/// Location of a field inside the raw config, e.g. `markdown.remarkPlugins[1]`.
#[derive(Debug, Clone, Default)]
struct FieldPath(String);

impl FieldPath {
    fn root() -> Self {
        Self::default()
    }

    fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

#[derive(Debug, Default)]
struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    fn finish<T>(self, value: T) -> Result<T, ValidationFailure> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationFailure::new(self.issues))
        }
    }

    fn report(&mut self, path: &FieldPath, expected: impl Into<String>, received: &RawValue) {
        self.push(path, expected, received.summary());
    }

    fn report_missing(&mut self, path: &FieldPath, expected: impl Into<String>) {
        self.push(path, expected, "undefined".to_string());
    }

    fn push(&mut self, path: &FieldPath, expected: impl Into<String>, received: String) {
        self.issues.push(Issue {
            path: path.to_string(),
            expected: expected.into(),
            received,
        });
    }

    fn string(&mut self, value: Option<&RawValue>, path: &FieldPath, default: &str) -> String {
        match value {
            None => default.to_string(),
            Some(RawValue::String(s)) => s.clone(),
            Some(other) => {
                self.report(path, "string", other);
                default.to_string()
            }
        }
    }

    fn boolean(&mut self, value: Option<&RawValue>, path: &FieldPath, default: bool) -> bool {
        match value {
            None => default,
            Some(RawValue::Bool(b)) => *b,
            Some(other) => {
                self.report(path, "boolean", other);
                default
            }
        }
    }

    fn choice<T: Copy>(
        &mut self,
        value: Option<&RawValue>,
        path: &FieldPath,
        choices: &[(&str, T)],
        default: T,
    ) -> T {
        let Some(value) = value else {
            return default;
        };

        let found = value
            .as_str()
            .and_then(|s| choices.iter().find(|(name, _)| *name == s));
        match found {
            Some((_, choice)) => *choice,
            None => {
                self.report(path, quoted_choices(choices), value);
                default
            }
        }
    }

    /// Object-typed field. Returns `None` when absent or invalid.
    fn object<'a>(&mut self, value: Option<&'a RawValue>, path: &FieldPath) -> Option<&'a RawMap> {
        match value? {
            RawValue::Object(map) => Some(map),
            other => {
                self.report(path, "object", other);
                None
            }
        }
    }

    /// Opaque object whose contents are never inspected.
    fn open_object(&mut self, value: Option<&RawValue>, path: &FieldPath) -> RawMap {
        self.object(value, path).cloned().unwrap_or_default()
    }

    /// Array-typed field. Returns `None` when absent or invalid.
    fn array<'a>(&mut self, value: Option<&'a RawValue>, path: &FieldPath) -> Option<&'a [RawValue]> {
        match value? {
            RawValue::Array(items) => Some(items),
            other => {
                self.report(path, "array", other);
                None
            }
        }
    }

    fn site(&mut self, value: Option<&RawValue>, path: &FieldPath) -> Option<Url> {
        match value? {
            RawValue::String(s) => match Url::parse(&append_forward_slash(s)) {
                Ok(url) => Some(url),
                Err(_) => {
                    self.push(path, "valid URL", format!("'{s}'"));
                    None
                }
            },
            other => {
                self.report(path, "string", other);
                None
            }
        }
    }

    fn integration(&mut self, value: &RawValue, path: &FieldPath) -> Option<Integration> {
        let Some(map) = value.as_object() else {
            self.report(path, "object", value);
            return None;
        };

        let name_path = path.key("name");
        let name = match map.get("name") {
            Some(RawValue::String(name)) => Some(name.clone()),
            Some(other) => {
                self.report(&name_path, "string", other);
                None
            }
            None => {
                self.report_missing(&name_path, "string");
                None
            }
        };
        let hooks = self.open_object(map.get("hooks"), &path.key("hooks"));

        Some(Integration { name: name?, hooks })
    }

    fn integrations(&mut self, value: Option<&RawValue>, path: &FieldPath) -> Vec<Integration> {
        let Some(items) = self.array(value, path) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.integration(item, &path.index(i)))
            .collect()
    }

    fn build(&mut self, value: Option<&RawValue>, path: &FieldPath) -> BuildConfig<String> {
        let Some(map) = self.object(value, path) else {
            return BuildConfig::default();
        };

        BuildConfig {
            format: self.choice(
                map.get("format"),
                &path.key("format"),
                &[("file", BuildFormat::File), ("directory", BuildFormat::Directory)],
                BuildFormat::default(),
            ),
            client: self.string(map.get("client"), &path.key("client"), defaults::BUILD_CLIENT),
            server: self.string(map.get("server"), &path.key("server"), defaults::BUILD_SERVER),
            server_entry: self.string(
                map.get("serverEntry"),
                &path.key("serverEntry"),
                defaults::BUILD_SERVER_ENTRY,
            ),
        }
    }

    fn server(&mut self, value: Option<&RawValue>, path: &FieldPath) -> ServerConfig {
        let Some(map) = self.object(value, path) else {
            return ServerConfig::default();
        };

        let host = match map.get("host") {
            None => ServerHost::Enabled(defaults::SERVER_HOST),
            Some(RawValue::Bool(b)) => ServerHost::Enabled(*b),
            Some(RawValue::String(s)) => ServerHost::Address(s.clone()),
            Some(other) => {
                self.report(&path.key("host"), "string | boolean", other);
                ServerHost::Enabled(defaults::SERVER_HOST)
            }
        };

        let port = match map.get("port") {
            None => defaults::SERVER_PORT,
            Some(RawValue::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    self.push(&path.key("port"), "port number (0-65535)", n.to_string());
                    defaults::SERVER_PORT
                }
            },
            Some(other) => {
                self.report(&path.key("port"), "number", other);
                defaults::SERVER_PORT
            }
        };

        ServerConfig {
            host,
            port,
            headers: map.get("headers").cloned(),
            streaming: self.boolean(
                map.get("streaming"),
                &path.key("streaming"),
                defaults::SERVER_STREAMING,
            ),
        }
    }

    fn style(&mut self, value: Option<&RawValue>, path: &FieldPath) -> StyleConfig {
        let Some(map) = self.object(value, path) else {
            return StyleConfig::default();
        };

        StyleConfig {
            postcss: self.postcss(map.get("postcss"), &path.key("postcss")),
        }
    }

    fn postcss(&mut self, value: Option<&RawValue>, path: &FieldPath) -> PostcssConfig {
        let Some(map) = self.object(value, path) else {
            return PostcssConfig::default();
        };

        let plugins_path = path.key("plugins");
        let plugins = match map.get("plugins") {
            Some(RawValue::Array(items)) => items.clone(),
            Some(other) => {
                self.report(&plugins_path, "array", other);
                Vec::new()
            }
            None => {
                self.report_missing(&plugins_path, "array");
                Vec::new()
            }
        };

        PostcssConfig {
            options: map
                .get("options")
                .cloned()
                .unwrap_or_else(RawValue::empty_object),
            plugins,
        }
    }

    fn markdown(&mut self, value: Option<&RawValue>, path: &FieldPath) -> MarkdownConfig {
        let Some(map) = self.object(value, path) else {
            return MarkdownConfig::default();
        };

        let highlight_path = path.key("syntaxHighlight");
        let syntax_highlight = match map.get("syntaxHighlight") {
            Some(RawValue::Bool(false)) => SyntaxHighlight::Disabled,
            other => {
                let choices = [
                    ("shiki", SyntaxHighlight::Shiki),
                    ("prism", SyntaxHighlight::Prism),
                ];
                match other {
                    Some(value) if value.as_str().is_none() => {
                        self.report(&highlight_path, "'shiki' | 'prism' | false", value);
                        SyntaxHighlight::default()
                    }
                    _ => self.choice(other, &highlight_path, &choices, SyntaxHighlight::default()),
                }
            }
        };

        MarkdownConfig {
            drafts: self.boolean(map.get("drafts"), &path.key("drafts"), false),
            syntax_highlight,
            shiki_config: self.shiki(map.get("shikiConfig"), &path.key("shikiConfig")),
            remark_plugins: self.plugins(map.get("remarkPlugins"), &path.key("remarkPlugins")),
            rehype_plugins: self.plugins(map.get("rehypePlugins"), &path.key("rehypePlugins")),
            remark_rehype: self.open_object(map.get("remarkRehype"), &path.key("remarkRehype")),
            extend_default_plugins: self.boolean(
                map.get("extendDefaultPlugins"),
                &path.key("extendDefaultPlugins"),
                false,
            ),
        }
    }

    fn shiki(&mut self, value: Option<&RawValue>, path: &FieldPath) -> ShikiConfig {
        let Some(map) = self.object(value, path) else {
            return ShikiConfig::default();
        };

        let langs = self
            .array(map.get("langs"), &path.key("langs"))
            .map(<[RawValue]>::to_vec)
            .unwrap_or_default();

        let theme = match map.get("theme") {
            None => ShikiTheme::Named(defaults::SHIKI_THEME.to_string()),
            Some(RawValue::String(name)) => ShikiTheme::Named(name.clone()),
            Some(custom) => ShikiTheme::Custom(custom.clone()),
        };

        let wrap = match map.get("wrap") {
            None => defaults::SHIKI_WRAP,
            Some(RawValue::Null) => None,
            Some(RawValue::Bool(b)) => Some(*b),
            Some(other) => {
                self.report(&path.key("wrap"), "boolean | null", other);
                defaults::SHIKI_WRAP
            }
        };

        ShikiConfig { langs, theme, wrap }
    }

    fn plugins(&mut self, value: Option<&RawValue>, path: &FieldPath) -> Vec<PluginEntry> {
        let Some(items) = self.array(value, path) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let entry = plugin_entry(item);
                if entry.is_none() {
                    self.report(
                        &path.index(i),
                        "plugin name, function, or [plugin, options] tuple",
                        item,
                    );
                }
                entry
            })
            .collect()
    }

    fn legacy(&mut self, value: Option<&RawValue>, path: &FieldPath) -> LegacyConfig {
        let Some(map) = self.object(value, path) else {
            return LegacyConfig::default();
        };

        LegacyConfig {
            astro_flavored_markdown: self.boolean(
                map.get("astroFlavoredMarkdown"),
                &path.key("astroFlavoredMarkdown"),
                false,
            ),
        }
    }
}

fn plugin_ref(value: &RawValue) -> Option<PluginRef> {
    match value {
        RawValue::String(name) => Some(PluginRef::Name(name.clone())),
        RawValue::Function(func) => Some(PluginRef::Function(func.clone())),
        _ => None,
    }
}

fn plugin_entry(value: &RawValue) -> Option<PluginEntry> {
    if let RawValue::Array(pair) = value {
        let [plugin, options] = pair.as_slice() else {
            return None;
        };
        return Some(PluginEntry {
            plugin: plugin_ref(plugin)?,
            options: Some(options.clone()),
        });
    }

    Some(PluginEntry {
        plugin: plugin_ref(value)?,
        options: None,
    })
}

fn quoted_choices<T>(choices: &[(&str, T)]) -> String {
    choices
        .iter()
        .map(|(name, _)| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}
