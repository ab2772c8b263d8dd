//! Sitekit CLI Library
//!
//! Command implementations for the `sitekit` binary, exposed as a library so they
//! can be driven from tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (check)
//!
//! # Example
//!
//! ```no_run
//! use sitekit::cmd::check::{self, CheckOptions};
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! check::run(None, &CheckOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;

pub use sitekit_config::{Command, Config, RelativeSchema};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
