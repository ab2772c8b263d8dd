//! Check command - validate and resolve the site configuration

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use sitekit_config::{
    Command, Config, ConfigError, RawValue, RelativeSchema, ServerHost, TracingSink,
    loader::{self, CliFlags},
};

/// Config file names tried in the project directory when `--config` is not given.
const DEFAULT_CONFIG_FILES: [&str; 4] = [
    "sitekit.toml",
    "sitekit.json",
    "sitekit.yaml",
    "sitekit.yml",
];

/// Options for the check command.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub command: Command,
    pub root: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<ServerHost>,
    pub site: Option<String>,
    pub base: Option<String>,
    pub json: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            command: Command::Dev,
            root: None,
            port: None,
            host: None,
            site: None,
            base: None,
            json: false,
        }
    }
}

/// Run the check command.
///
/// Loads the config file (or an empty config when no default file exists), applies
/// the CLI overrides and resolves it for the given command.
pub async fn run(config_path: Option<&Path>, options: &CheckOptions) -> Result<()> {
    let config = resolve(config_path, options).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print_summary(&config, options.command);
    }

    Ok(())
}

/// Load, override and resolve the configuration without printing it.
pub async fn resolve(config_path: Option<&Path>, options: &CheckOptions) -> Result<Config> {
    let project_dir = project_dir(options.root.as_deref())?;
    tracing::info!(?config_path, project_dir = %project_dir.display(), command = %options.command, "Checking configuration");

    let schema = RelativeSchema::from_path(options.command, &project_dir)?;
    let mut raw = load_config(config_path, &project_dir)?;
    loader::apply_cli_flags(
        &mut raw,
        &CliFlags {
            root: options.root.as_ref().map(|_| schema.root().to_string()),
            site: options.site.clone(),
            base: options.base.clone(),
            port: options.port,
            host: options.host.clone(),
        },
    );

    match schema.parse(&raw, &TracingSink).await {
        Ok(config) => Ok(config),
        Err(ConfigError::Validation(failure)) => {
            println!("Configuration invalid:");
            for issue in &failure.issues {
                println!("  ✗ {issue}");
            }
            bail!(
                "Validation failed with {} error(s)",
                failure.issues.len()
            );
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a `--host` value: `true`/`false` toggle network exposure, anything else is
/// an address.
pub fn parse_host(value: &str) -> std::result::Result<ServerHost, String> {
    match value {
        "true" => Ok(ServerHost::Enabled(true)),
        "false" => Ok(ServerHost::Enabled(false)),
        "" => Err("host must not be empty".to_string()),
        address => Ok(ServerHost::Address(address.to_string())),
    }
}

fn project_dir(root: Option<&Path>) -> Result<PathBuf> {
    let dir = root.unwrap_or_else(|| Path::new("."));
    dir.canonicalize()
        .wrap_err_with(|| format!("Project directory {} is not accessible", dir.display()))
}

fn load_config(config_path: Option<&Path>, project_dir: &Path) -> Result<RawValue> {
    if let Some(path) = config_path {
        return Ok(loader::load_raw(path)?);
    }

    for name in DEFAULT_CONFIG_FILES {
        let path = project_dir.join(name);
        if path.exists() {
            return Ok(loader::load_raw(&path)?);
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(RawValue::empty_object())
}

fn print_summary(config: &Config, command: Command) {
    println!("✓ Configuration valid ({command})");
    println!();
    println!("  root:       {}", config.root);
    println!("  srcDir:     {}", config.src_dir);
    println!("  publicDir:  {}", config.public_dir);
    println!("  outDir:     {}", config.out_dir);
    println!("  build:      client {}", config.build.client);
    println!("              server {}", config.build.server);
    if let Some(site) = &config.site {
        println!("  site:       {site}");
    }
    println!("  base:       {}", config.base);

    let host = match &config.server.host {
        ServerHost::Enabled(true) => "all addresses".to_string(),
        ServerHost::Enabled(false) => "localhost".to_string(),
        ServerHost::Address(address) => address.clone(),
    };
    println!("  server:     {host}:{}", config.server.port);

    if !config.integrations.is_empty() {
        let names: Vec<_> = config.integrations.iter().map(|i| i.name.as_str()).collect();
        println!("  integrations: {}", names.join(", "));
    }
}
