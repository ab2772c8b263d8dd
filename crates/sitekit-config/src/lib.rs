//! Sitekit Config Library
//!
//! Validation and normalization of static-site configuration. A loosely-typed
//! [`RawValue`] (config file plus CLI overrides) goes in; a fully-typed [`Config`]
//! with absolute locations and consistent defaults comes out.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sitekit_config::{Command, RelativeSchema, TracingSink, loader};
//!
//! # async fn run() -> sitekit_config::Result<()> {
//! let raw = loader::load_raw(Path::new("sitekit.toml"))?;
//! let schema = RelativeSchema::from_path(Command::Build, Path::new("/srv/site"))?;
//! let config = schema.parse(&raw, &TracingSink).await?;
//! println!("{}", config.out_dir);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod path;
pub mod postcss;
pub mod relative;
pub mod schema;
pub mod transform;
pub mod value;

pub use config::{
    BuildConfig, BuildFormat, Config, Integration, LegacyConfig, MarkdownConfig, OutputMode,
    PluginEntry, PluginRef, PostcssConfig, ServerConfig, ServerHost, ShikiConfig, ShikiTheme,
    StyleConfig, SyntaxHighlight, TrailingSlash,
};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, MemorySink, TracingSink};
pub use error::{ConfigError, Issue, Result, ValidationFailure};
pub use postcss::resolve_postcss_config;
pub use relative::{Command, RelativeSchema};
pub use value::{Callable, RawMap, RawValue};
