//! The typed configuration record.
//!
//! [`Config`] is generic over how locations are represented. The base schema yields
//! `Config<String>` (locations exactly as the user wrote them, defaults filled in); the
//! relative schema resolves those against a root and yields `Config<Url>`, which is the
//! record the rest of the pipeline consumes.

use serde::{Serialize, Serializer};
use url::Url;

use crate::{
    defaults,
    value::{Callable, RawMap, RawValue},
};

/// Fully validated site configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config<L = Url> {
    /// Project root.
    pub root: L,

    /// Source directory.
    pub src_dir: L,

    /// Static assets copied verbatim into the output.
    pub public_dir: L,

    /// Build output directory.
    pub out_dir: L,

    /// Deployed site URL, always ending with `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Url>,

    /// Base path the site is served under.
    pub base: String,

    pub trailing_slash: TrailingSlash,

    pub output: OutputMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Integration>,

    pub integrations: Vec<Integration>,

    pub build: BuildConfig<L>,

    pub server: ServerConfig,

    pub style: StyleConfig,

    pub markdown: MarkdownConfig,

    /// Passthrough options for the bundler.
    pub vite: RawMap,

    pub legacy: LegacyConfig,

    pub experimental_error_overlay: bool,
}

/// Route trailing-slash policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlash {
    Always,
    Never,
    #[default]
    Ignore,
}

/// Whether the site is prerendered or served on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Static,
    Server,
}

/// Page output layout: `about.html` vs `about/index.html`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFormat {
    File,
    #[default]
    Directory,
}

/// A named set of lifecycle hooks, used for both integrations and the adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Integration {
    pub name: String,
    /// Hook name to hook value. Never inspected.
    pub hooks: RawMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig<L = Url> {
    pub format: BuildFormat,
    /// Client bundle output.
    pub client: L,
    /// Server bundle output.
    pub server: L,
    /// File name of the server entrypoint.
    pub server_entry: String,
}

/// Dev/preview server settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: ServerHost,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<RawValue>,
    pub streaming: bool,
}

/// `server.host`: either an explicit address or a listen-on-all-interfaces toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServerHost {
    Enabled(bool),
    Address(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleConfig {
    pub postcss: PostcssConfig,
}

/// Resolved PostCSS processing options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostcssConfig {
    pub options: RawValue,
    pub plugins: Vec<RawValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownConfig {
    pub drafts: bool,
    pub syntax_highlight: SyntaxHighlight,
    pub shiki_config: ShikiConfig,
    pub remark_plugins: Vec<PluginEntry>,
    pub rehype_plugins: Vec<PluginEntry>,
    pub remark_rehype: RawMap,
    pub extend_default_plugins: bool,
}

/// Code block highlighter. `false` in the raw config disables highlighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyntaxHighlight {
    #[default]
    Shiki,
    Prism,
    Disabled,
}

impl Serialize for SyntaxHighlight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Shiki => serializer.serialize_str("shiki"),
            Self::Prism => serializer.serialize_str("prism"),
            Self::Disabled => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShikiConfig {
    /// Extra language registrations, passed through untouched.
    pub langs: Vec<RawValue>,
    pub theme: ShikiTheme,
    /// `None` mirrors an explicit `null` in the raw config.
    pub wrap: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShikiTheme {
    /// A theme bundled with the highlighter, referenced by name.
    Named(String),
    /// A full theme registration object.
    Custom(RawValue),
}

/// A remark/rehype plugin reference with optional options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginEntry {
    pub plugin: PluginRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RawValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PluginRef {
    /// Package name, resolved by the markdown pipeline.
    Name(String),
    Function(Callable),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConfig {
    pub astro_flavored_markdown: bool,
}

impl Default for Config<String> {
    fn default() -> Self {
        Self {
            root: defaults::ROOT.to_string(),
            src_dir: defaults::SRC_DIR.to_string(),
            public_dir: defaults::PUBLIC_DIR.to_string(),
            out_dir: defaults::OUT_DIR.to_string(),
            site: None,
            base: defaults::BASE.to_string(),
            trailing_slash: TrailingSlash::default(),
            output: OutputMode::default(),
            adapter: None,
            integrations: Vec::new(),
            build: BuildConfig::default(),
            server: ServerConfig::default(),
            style: StyleConfig::default(),
            markdown: MarkdownConfig::default(),
            vite: RawMap::new(),
            legacy: LegacyConfig::default(),
            experimental_error_overlay: false,
        }
    }
}

impl Default for BuildConfig<String> {
    fn default() -> Self {
        Self {
            format: BuildFormat::default(),
            client: defaults::BUILD_CLIENT.to_string(),
            server: defaults::BUILD_SERVER.to_string(),
            server_entry: defaults::BUILD_SERVER_ENTRY.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: ServerHost::Enabled(defaults::SERVER_HOST),
            port: defaults::SERVER_PORT,
            headers: None,
            streaming: defaults::SERVER_STREAMING,
        }
    }
}

impl Default for PostcssConfig {
    fn default() -> Self {
        Self {
            options: RawValue::empty_object(),
            plugins: Vec::new(),
        }
    }
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            drafts: false,
            syntax_highlight: SyntaxHighlight::default(),
            shiki_config: ShikiConfig::default(),
            remark_plugins: Vec::new(),
            rehype_plugins: Vec::new(),
            remark_rehype: RawMap::new(),
            extend_default_plugins: false,
        }
    }
}

impl Default for ShikiConfig {
    fn default() -> Self {
        Self {
            langs: Vec::new(),
            theme: ShikiTheme::Named(defaults::SHIKI_THEME.to_string()),
            wrap: defaults::SHIKI_WRAP,
        }
    }
}

impl Config {
    /// Absolute URL of a site path, if `site` is configured.
    pub fn url_for(&self, path: &str) -> Option<Url> {
        let site = self.site.as_ref()?;
        let base = self.base.trim_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if base.is_empty() {
            path.to_string()
        } else {
            format!("{base}/{path}")
        };
        site.join(&format!("/{joined}")).ok()
    }
}
