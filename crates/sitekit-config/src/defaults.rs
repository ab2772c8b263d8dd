//! Fallback values for every configuration field.

pub const ROOT: &str = ".";
pub const SRC_DIR: &str = "./src";
pub const PUBLIC_DIR: &str = "./public";
pub const OUT_DIR: &str = "./dist";

pub const BASE: &str = "/";

pub const BUILD_CLIENT: &str = "./dist/client/";
pub const BUILD_SERVER: &str = "./dist/server/";
pub const BUILD_SERVER_ENTRY: &str = "entry.mjs";

/// Suffix identifying a `build.client` that still points at the default location.
pub const BUILD_CLIENT_SUFFIX: &str = "dist/client/";
/// Suffix identifying a `build.server` that still points at the default location.
pub const BUILD_SERVER_SUFFIX: &str = "dist/server/";
/// `build.client` relative to `outDir` when it has to be re-derived.
pub const BUILD_CLIENT_SUBDIR: &str = "client/";
/// `build.server` relative to `outDir` when it has to be re-derived.
pub const BUILD_SERVER_SUBDIR: &str = "server/";

pub const SERVER_HOST: bool = false;
pub const SERVER_PORT: u16 = 3000;
pub const SERVER_STREAMING: bool = true;

pub const SHIKI_THEME: &str = "github-dark";
pub const SHIKI_WRAP: Option<bool> = Some(false);

/// Command name handed to a `server` function when no concrete command is known.
pub const PLACEHOLDER_COMMAND: &str = "error";
