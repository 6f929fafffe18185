//! Shared plumbing for the FauxAPI command-line programs.

#![deny(missing_docs)]

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use fauxapi_core::config::{FauxapiConfig, ENV_API_KEY, ENV_API_SECRET};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Usage text shown for missing arguments or credentials.
#[must_use]
pub fn usage_text(program: &str) -> String {
    format!(
        "\n\
         usage: {program} <host>\n\
         \n  Environment variables containing credentials MUST be set before use!\n\
         \x20   $ export {ENV_API_KEY}=PFFAyourkeyvalue\n\
         \x20   $ export {ENV_API_SECRET}=devtrashdevtrashdevtrashdevtrashdevtrash\n\
         \n\
         pipe JSON output through jq for easy pretty print output:-\n\
         \x20$ {program} <host> | jq .\n"
    )
}

/// Print the usage text to stdout and exit with status 1.
pub fn exit_with_usage(program: &str) -> ! {
    println!("{}", usage_text(program));
    std::process::exit(1)
}

/// Parse arguments, falling back to the usage text on any error other than
/// `--help`/`--version`.
pub fn parse_args_or_usage<P: Parser>(program: &str) -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => exit_with_usage(program),
    }
}

/// Build the appliance configuration from `host` and the credential
/// environment variables, falling back to the usage text when either is missing.
pub fn config_or_usage(program: &str, host: &str) -> FauxapiConfig {
    FauxapiConfig::from_env(host).unwrap_or_else(|_| exit_with_usage(program))
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Write `value` to stdout as a single line of JSON.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
