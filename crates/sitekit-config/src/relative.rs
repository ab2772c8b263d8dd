//! Root- and command-aware configuration schema.

use std::{fmt, path::Path, str::FromStr};

use tracing::{debug, info};
use url::Url;

use crate::{
    config::{BuildConfig, Config},
    diagnostics::DiagnosticSink,
    error::{ConfigError, Issue, Result, ValidationFailure},
    path::append_forward_slash,
    postcss::resolve_postcss_value,
    schema, transform,
    value::RawValue,
};

/// The CLI command a configuration is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dev,
    Build,
    Preview,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Build => "build",
            Self::Preview => "preview",
        }
    }

    /// Command name passed to a `server` function. Anything but `dev` is `preview`.
    pub fn server_command(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Build | Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Self::Dev),
            "build" => Ok(Self::Build),
            "preview" => Ok(Self::Preview),
            other => Err(ConfigError::InvalidCommand(other.to_string())),
        }
    }
}

/// Schema specialized to a project root and command.
///
/// Compared to [`schema::parse`], it resolves every location against the root, calls a
/// `server` function with the real command (keeping CLI `port`/`host` overrides),
/// resolves PostCSS options and runs the post-validation transforms.
#[derive(Debug, Clone)]
pub struct RelativeSchema {
    command: Command,
    root: Url,
}

impl RelativeSchema {
    /// Create a schema anchored at `root`. A missing trailing `/` is added.
    pub fn new(command: Command, mut root: Url) -> Result<Self> {
        if root.cannot_be_a_base() {
            return Err(ConfigError::InvalidRoot(root.to_string()));
        }
        if !root.path().ends_with('/') {
            let path = append_forward_slash(root.path());
            root.set_path(&path);
        }
        Ok(Self { command, root })
    }

    /// Create a schema anchored at an absolute directory path.
    pub fn from_path(command: Command, root: &Path) -> Result<Self> {
        let url = Url::from_directory_path(root)
            .map_err(|()| ConfigError::InvalidRoot(root.display().to_string()))?;
        Self::new(command, url)
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Validate and normalize a raw configuration.
    ///
    /// Fails with [`ConfigError::Validation`] listing every invalid field, or with
    /// [`ConfigError::Resolution`] if a PostCSS config file exists but cannot be read.
    pub async fn parse(&self, raw: &RawValue, sink: &dyn DiagnosticSink) -> Result<Config> {
        info!(command = %self.command, root = %self.root, "Resolving configuration");

        let mut prepared = schema::preprocess(raw.clone(), self.command.server_command(), true);
        if let Some(map) = prepared.as_object_mut() {
            let style = map
                .entry("style".to_string())
                .or_insert_with(RawValue::empty_object);
            if let Some(style) = style.as_object_mut() {
                let postcss = resolve_postcss_value(style.get("postcss"), &self.root).await?;
                style.insert("postcss".to_string(), postcss);
            }
        }

        let config = match schema::validate(&prepared) {
            Ok(config) => config,
            Err(mut failure) => {
                failure.issues.extend(self.location_issues(&prepared));
                return Err(failure.into());
            }
        };
        let config = self.resolve_locations(config)?;
        Ok(transform::apply(config, sink))
    }

    fn resolve_locations(&self, config: Config<String>) -> std::result::Result<Config, ValidationFailure> {
        let mut issues = Vec::new();

        let resolved = Config {
            root: self.join(&append_forward_slash(&config.root), "root", &mut issues),
            src_dir: self.join(&append_forward_slash(&config.src_dir), "srcDir", &mut issues),
            public_dir: self.join(
                &append_forward_slash(&config.public_dir),
                "publicDir",
                &mut issues,
            ),
            out_dir: self.join(&append_forward_slash(&config.out_dir), "outDir", &mut issues),
            build: BuildConfig {
                format: config.build.format,
                client: self.join(&config.build.client, "build.client", &mut issues),
                server: self.join(&config.build.server, "build.server", &mut issues),
                server_entry: config.build.server_entry,
            },
            site: config.site,
            base: config.base,
            trailing_slash: config.trailing_slash,
            output: config.output,
            adapter: config.adapter,
            integrations: config.integrations,
            server: config.server,
            style: config.style,
            markdown: config.markdown,
            vite: config.vite,
            legacy: config.legacy,
            experimental_error_overlay: config.experimental_error_overlay,
        };

        if issues.is_empty() {
            Ok(resolved)
        } else {
            Err(ValidationFailure::new(issues))
        }
    }

    /// Join failures for the raw location strings, used when structural validation
    /// already failed so both kinds of issue are reported together.
    fn location_issues(&self, raw: &RawValue) -> Vec<Issue> {
        let mut issues = Vec::new();
        for field in ["root", "srcDir", "publicDir", "outDir"] {
            if let Some(location) = raw.get(field).and_then(RawValue::as_str) {
                self.join(&append_forward_slash(location), field, &mut issues);
            }
        }
        let build = raw.get("build");
        for field in ["client", "server"] {
            if let Some(location) = build.and_then(|b| b.get(field)).and_then(RawValue::as_str) {
                self.join(location, &format!("build.{field}"), &mut issues);
            }
        }
        issues
    }

    fn join(&self, location: &str, path: &str, issues: &mut Vec<Issue>) -> Url {
        match self.root.join(location) {
            Ok(url) => {
                debug!(field = path, %url, "Resolved location");
                url
            }
            Err(e) => {
                issues.push(Issue {
                    path: path.to_string(),
                    expected: format!("location relative to the project root ({e})"),
                    received: format!("'{location}'"),
                });
                self.root.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::{ServerHost, TrailingSlash},
        diagnostics::MemorySink,
        value::Callable,
    };

    fn schema_for(command: Command, dir: &Path) -> RelativeSchema {
        RelativeSchema::from_path(command, dir).expect("schema")
    }

    #[test]
    fn test_command_round_trip_and_server_command() {
        assert_eq!("dev".parse::<Command>().expect("command"), Command::Dev);
        assert_eq!(Command::Build.to_string(), "build");
        assert_eq!(Command::Build.server_command(), "preview");
        assert_eq!(Command::Preview.server_command(), "preview");
        assert_eq!(Command::Dev.server_command(), "dev");
        assert!(matches!(
            "serve".parse::<Command>(),
            Err(ConfigError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_root_gets_trailing_slash() {
        let root = Url::parse("file:///srv/site").expect("url");
        let schema = RelativeSchema::new(Command::Build, root).expect("schema");
        assert_eq!(schema.root().as_str(), "file:///srv/site/");
    }

    #[test]
    fn test_root_must_be_a_base() {
        let root = Url::parse("data:text/plain,hello").expect("url");
        assert!(matches!(
            RelativeSchema::new(Command::Build, root),
            Err(ConfigError::InvalidRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_locations_resolve_against_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let schema = schema_for(Command::Build, dir.path());
        let root = schema.root().clone();

        let config = schema
            .parse(
                &RawValue::from(json!({ "srcDir": "./source", "publicDir": "/abs/static" })),
                &MemorySink::new(),
            )
            .await
            .expect("valid config");

        assert_eq!(config.root, root);
        assert_eq!(config.src_dir, root.join("source/").expect("join"));
        assert_eq!(config.public_dir.as_str(), "file:///abs/static/");
        assert_eq!(config.out_dir, root.join("dist/").expect("join"));
        assert_eq!(config.build.client, root.join("dist/client/").expect("join"));
        assert_eq!(config.build.server, root.join("dist/server/").expect("join"));
    }

    #[tokio::test]
    async fn test_server_function_receives_command_and_keeps_cli_overrides() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let server = Callable::new(|ctx| {
            let host = if ctx.get("command") == Some(&RawValue::from("dev")) {
                "localhost"
            } else {
                "0.0.0.0"
            };
            RawValue::object([("host", RawValue::from(host)), ("port", RawValue::from(3001u16))])
        })
        .with_attr("port", 5050u16);
        let raw = RawValue::object([("server", RawValue::from(server))]);
        let sink = MemorySink::new();

        let dev = schema_for(Command::Dev, dir.path())
            .parse(&raw, &sink)
            .await
            .expect("valid config");
        assert_eq!(dev.server.host, ServerHost::Address("localhost".to_string()));
        assert_eq!(dev.server.port, 5050);

        let preview = schema_for(Command::Preview, dir.path())
            .parse(&raw, &sink)
            .await
            .expect("valid config");
        assert_eq!(preview.server.host, ServerHost::Address("0.0.0.0".to_string()));
    }

    #[tokio::test]
    async fn test_falsy_cli_override_is_ignored() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let server = Callable::new(|_| RawValue::object([("host", RawValue::from(true))]))
            .with_attr("host", false);
        let raw = RawValue::object([("server", RawValue::from(server))]);

        let config = schema_for(Command::Dev, dir.path())
            .parse(&raw, &MemorySink::new())
            .await
            .expect("valid config");
        assert_eq!(config.server.host, ServerHost::Enabled(true));
    }

    #[tokio::test]
    async fn test_validation_failure_returns_no_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = schema_for(Command::Build, dir.path())
            .parse(
                &RawValue::from(json!({ "trailingSlash": "sometimes", "base": "docs" })),
                &MemorySink::new(),
            )
            .await
            .unwrap_err();

        let issue = err
            .issues()
            .iter()
            .find(|i| i.path == "trailingSlash")
            .expect("trailingSlash issue");
        assert_eq!(issue.received, "'sometimes'");
    }

    #[tokio::test]
    async fn test_location_and_structural_issues_are_reported_together() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = schema_for(Command::Build, dir.path())
            .parse(
                &RawValue::from(json!({ "trailingSlash": "sometimes", "outDir": "http://[::1" })),
                &MemorySink::new(),
            )
            .await
            .unwrap_err();

        let paths: Vec<_> = err.issues().iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"trailingSlash"), "{paths:?}");
        assert!(paths.contains(&"outDir"), "{paths:?}");
    }

    #[test]
    fn test_parse_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let dir = tempfile::tempdir().expect("create temp dir");
        let schema = schema_for(Command::Dev, dir.path());
        let raw = RawValue::empty_object();
        let sink = MemorySink::new();
        let future = schema.parse(&raw, &sink);
        assert_send(&future);
    }

    #[tokio::test]
    async fn test_parse_runs_on_spawned_task() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let schema = schema_for(Command::Dev, dir.path());

        let config = tokio::spawn(async move {
            schema
                .parse(&RawValue::empty_object(), &crate::diagnostics::TracingSink)
                .await
        })
        .await
        .expect("join")
        .expect("valid config");
        assert_eq!(config.base, "/");
    }

    #[tokio::test]
    async fn test_post_transforms_run() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let sink = MemorySink::new();
        let config = schema_for(Command::Build, dir.path())
            .parse(
                &RawValue::from(json!({ "base": "docs", "trailingSlash": "never", "outDir": "out" })),
                &sink,
            )
            .await
            .expect("valid config");

        assert_eq!(config.base, "/docs");
        assert_eq!(config.trailing_slash, TrailingSlash::Never);
        assert!(config.build.server.as_str().ends_with("/out/server/"));
        assert!(sink.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_url_for_uses_site_and_base() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = schema_for(Command::Build, dir.path())
            .parse(
                &RawValue::from(json!({ "site": "https://example.com", "base": "/docs" })),
                &MemorySink::new(),
            )
            .await
            .expect("valid config");

        let url = config.url_for("/guide/intro/").expect("site configured");
        assert_eq!(url.as_str(), "https://example.com/docs/guide/intro/");
    }
}
