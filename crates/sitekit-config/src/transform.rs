//! Normalization applied to a validated, root-resolved configuration.
//!
//! Both steps depend on values that only exist after validation (`outDir`, `site`),
//! so they never run on a config that failed validation.

use tracing::debug;
use url::Url;

use crate::{
    config::{Config, TrailingSlash},
    defaults,
    diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink},
    path::{append_forward_slash, prepend_forward_slash, trim_slashes},
};

/// Run every post-validation step in order.
pub fn apply(mut config: Config, sink: &dyn DiagnosticSink) -> Config {
    adjust_build_dirs(&mut config);
    config.base = normalize_base(&config.base, config.site.as_ref(), config.trailing_slash, sink);
    config
}

/// Move default build directories under a customized `outDir`.
///
/// `build.client`/`build.server` are re-derived only when they lie outside `outDir`
/// and still end with their default `dist/...` suffix. A path the user set explicitly
/// to something else is left alone.
pub fn adjust_build_dirs(config: &mut Config) {
    rederive(
        &mut config.build.server,
        &config.out_dir,
        defaults::BUILD_SERVER_SUFFIX,
        defaults::BUILD_SERVER_SUBDIR,
    );
    rederive(
        &mut config.build.client,
        &config.out_dir,
        defaults::BUILD_CLIENT_SUFFIX,
        defaults::BUILD_CLIENT_SUBDIR,
    );
}

fn rederive(location: &mut Url, out_dir: &Url, default_suffix: &str, subdir: &str) {
    let current = location.as_str();
    if current.starts_with(out_dir.as_str()) || !current.ends_with(default_suffix) {
        return;
    }

    if let Ok(moved) = out_dir.join(subdir) {
        debug!(from = %location, to = %moved, "Moving build directory under outDir");
        *location = moved;
    }
}

/// Normalize `base` to a `/`-prefixed path.
///
/// An empty `base` falls back to the path of `site` (with a warning). A trailing `/`
/// is added unless the trailing-slash policy is `never`.
pub fn normalize_base(
    base: &str,
    site: Option<&Url>,
    trailing_slash: TrailingSlash,
    sink: &dyn DiagnosticSink,
) -> String {
    let mut core = trim_slashes(base);

    if core.is_empty() {
        if let Some(pathname) = site.map(Url::path).filter(|p| *p != "/") {
            sink.warn(Diagnostic {
                code: DiagnosticCode::BaseInferredFromSite,
                message: format!(
                    "The site configuration value includes a pathname of {pathname} but there \
                     is no base configuration. Using {pathname} as the base; set `base` \
                     explicitly to silence this warning."
                ),
            });
            core = trim_slashes(pathname);
        }
    }

    if trailing_slash == TrailingSlash::Never {
        prepend_forward_slash(core)
    } else {
        prepend_forward_slash(&append_forward_slash(core))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("url")
    }

    #[test]
    fn test_base_trailing_slash_policy() {
        let sink = MemorySink::new();
        assert_eq!(normalize_base("docs", None, TrailingSlash::Never, &sink), "/docs");
        assert_eq!(normalize_base("/docs/", None, TrailingSlash::Never, &sink), "/docs");
        assert_eq!(normalize_base("docs", None, TrailingSlash::Ignore, &sink), "/docs/");
        assert_eq!(normalize_base("/docs", None, TrailingSlash::Always, &sink), "/docs/");
        assert_eq!(normalize_base("a/b", None, TrailingSlash::Ignore, &sink), "/a/b/");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_empty_base_is_root() {
        let sink = MemorySink::new();
        assert_eq!(normalize_base("/", None, TrailingSlash::Never, &sink), "/");
        assert_eq!(normalize_base("", None, TrailingSlash::Ignore, &sink), "/");

        let site = url("https://example.com/");
        assert_eq!(normalize_base("/", Some(&site), TrailingSlash::Always, &sink), "/");
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_base_inferred_from_site_path() {
        let sink = MemorySink::new();
        let site = url("https://example.com/blog/");

        assert_eq!(normalize_base("/", Some(&site), TrailingSlash::Ignore, &sink), "/blog/");
        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::BaseInferredFromSite);
        assert!(diagnostics[0].message.contains("/blog/"));
    }

    #[test]
    fn test_base_inferred_respects_never() {
        let sink = MemorySink::new();
        let site = url("https://example.com/blog/");
        assert_eq!(normalize_base("", Some(&site), TrailingSlash::Never, &sink), "/blog");
    }

    #[test]
    fn test_explicit_base_wins_over_site() {
        let sink = MemorySink::new();
        let site = url("https://example.com/blog/");
        assert_eq!(normalize_base("docs", Some(&site), TrailingSlash::Ignore, &sink), "/docs/");
        assert!(sink.diagnostics().is_empty());
    }

    fn build_config(out_dir: &str, client: &str, server: &str) -> Config {
        let defaults = Config::<String>::default();
        Config {
            root: url("file:///site/"),
            src_dir: url("file:///site/src/"),
            public_dir: url("file:///site/public/"),
            out_dir: url(out_dir),
            site: None,
            base: defaults.base,
            trailing_slash: defaults.trailing_slash,
            output: defaults.output,
            adapter: None,
            integrations: Vec::new(),
            build: crate::config::BuildConfig {
                format: defaults.build.format,
                client: url(client),
                server: url(server),
                server_entry: defaults.build.server_entry,
            },
            server: defaults.server,
            style: defaults.style,
            markdown: defaults.markdown,
            vite: defaults.vite,
            legacy: defaults.legacy,
            experimental_error_overlay: false,
        }
    }

    #[test]
    fn test_build_dirs_follow_custom_out_dir() {
        let mut config = build_config(
            "file:///site/custom/",
            "file:///site/dist/client/",
            "file:///site/dist/server/",
        );
        adjust_build_dirs(&mut config);
        assert_eq!(config.build.client.as_str(), "file:///site/custom/client/");
        assert_eq!(config.build.server.as_str(), "file:///site/custom/server/");
    }

    #[test]
    fn test_build_dirs_inside_out_dir_untouched() {
        let mut config = build_config(
            "file:///site/dist/",
            "file:///site/dist/client/",
            "file:///site/dist/server/",
        );
        adjust_build_dirs(&mut config);
        assert_eq!(config.build.client.as_str(), "file:///site/dist/client/");
        assert_eq!(config.build.server.as_str(), "file:///site/dist/server/");
    }

    #[test]
    fn test_explicit_build_dirs_untouched() {
        let mut config = build_config(
            "file:///site/custom/",
            "file:///site/assets/",
            "file:///site/other/",
        );
        adjust_build_dirs(&mut config);
        assert_eq!(config.build.client.as_str(), "file:///site/assets/");
        assert_eq!(config.build.server.as_str(), "file:///site/other/");
    }

    #[test]
    fn test_suffix_rule_is_independent_per_directory() {
        let mut config = build_config(
            "file:///site/custom/",
            "file:///site/dist/client/",
            "file:///site/other/",
        );
        adjust_build_dirs(&mut config);
        assert_eq!(config.build.client.as_str(), "file:///site/custom/client/");
        assert_eq!(config.build.server.as_str(), "file:///site/other/");
    }
}
