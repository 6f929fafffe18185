//! Synchronises AWS `ip-ranges.json` prefixes into pfSense network aliases.

use anyhow::{Context, Result};
use clap::Parser;
use fauxapi_aliases::ranges::AWS_IP_RANGES_URL;
use fauxapi_aliases::{AliasFilter, AliasSync, IpRangesFetcher};
use fauxapi_cli::{config_or_usage, init_tracing, parse_args_or_usage, print_json};
use fauxapi_client::FauxapiClient;
use tracing::info;

const PROGRAM: &str = "update-aws-aliases";

/// Merge AWS address ranges into the appliance's alias list.
#[derive(Parser, Debug)]
#[command(name = PROGRAM, version, about)]
struct Args {
    /// Appliance host name or address
    host: String,

    /// Region pattern, `*` matches any
    #[arg(long, default_value = "ap-*")]
    regions: String,

    /// Service pattern, `*` matches any
    #[arg(long, default_value = "ec2")]
    services: String,

    /// Leave IPv4 prefixes out of the aliases
    #[arg(long)]
    no_ipv4: bool,

    /// Leave IPv6 prefixes out of the aliases
    #[arg(long)]
    no_ipv6: bool,

    /// Location of ip-ranges.json
    #[arg(long, default_value = AWS_IP_RANGES_URL)]
    source_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = parse_args_or_usage(PROGRAM);
    let config = config_or_usage(PROGRAM, &args.host);
    init_tracing()?;

    let client = FauxapiClient::new(config).context("failed to build FauxAPI client")?;
    let fetcher = IpRangesFetcher::with_source_url(&args.source_url)
        .with_context(|| format!("invalid source URL {}", args.source_url))?;

    let filter = AliasFilter::new(args.regions, args.services)
        .with_ipv4(!args.no_ipv4)
        .with_ipv6(!args.no_ipv6);

    let outcome = AliasSync::new(client, fetcher)
        .run(&filter)
        .await
        .context("alias synchronisation failed")?;

    info!(
        inserted = outcome.report.inserted.len(),
        updated = outcome.report.updated.len(),
        unchanged = outcome.report.unchanged.len(),
        "Aliases synchronised"
    );
    print_json(&outcome.response)?;
    Ok(())
}
