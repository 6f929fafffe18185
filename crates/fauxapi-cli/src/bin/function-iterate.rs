//! Walks every FauxAPI action against one appliance, printing each response.

use anyhow::{Context, Result};
use clap::Parser;
use fauxapi_cli::{config_or_usage, init_tracing, parse_args_or_usage, print_json};
use fauxapi_client::{FauxapiClient, FunctionCall};
use serde_json::{json, Value};
use tracing::info;

const PROGRAM: &str = "function-iterate";

/// Exercise each FauxAPI action in turn.
#[derive(Parser, Debug)]
#[command(name = PROGRAM, version, about)]
struct Args {
    /// Appliance host name or address
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = parse_args_or_usage(PROGRAM);
    let config = config_or_usage(PROGRAM, &args.host);
    init_tracing()?;

    let client = FauxapiClient::new(config).context("failed to build FauxAPI client")?;
    info!(host = %args.host, "Starting action walk");

    let config = config_round_trips(&client).await?;
    patch_and_restore(&client, &config).await?;

    print_json(&client.config_reload().await?)?;
    print_json(&client.config_backup().await?)?;
    print_json(&client.config_backup_list().await?)?;

    print_json(&client.system_stats().await?)?;
    print_json(&client.interface_stats("em0").await?)?;
    print_json(&client.gateway_status().await?)?;

    print_json(&client.send_event("filter reload").await?)?;
    print_json(&client.send_event("interface all reload").await?)?;

    print_json(&client.rule_get(None).await?)?;
    print_json(&client.rule_get(Some(5)).await?)?;
    print_json(&client.alias_update_urltables(None).await?)?;

    for call in function_calls() {
        let response = client
            .function_call(&call)
            .await
            .with_context(|| format!("function_call {} failed", call.function))?;
        print_json(&response)?;
    }

    print_json(&client.system_info().await?)?;
    Ok(())
}

/// Read and write back the whole configuration, then the `aliases` section.
///
/// Returns the configuration as first read.
async fn config_round_trips(client: &FauxapiClient) -> Result<Value> {
    let config = client.config_get(None).await?;
    print_json(&config)?;
    print_json(&client.config_set(&config, None).await?)?;

    let aliases = client.config_get(Some("aliases")).await?;
    print_json(&client.config_set(&aliases, Some("aliases")).await?)?;
    Ok(config)
}

/// Patch DNS servers and hostname, then put the originals back.
async fn patch_and_restore(client: &FauxapiClient, config: &Value) -> Result<()> {
    let system = config
        .get("system")
        .context("configuration has no `system` section")?;
    let original_dnsserver = system
        .get("dnsserver")
        .cloned()
        .unwrap_or_else(|| json!([""]));
    let original_hostname = system
        .get("hostname")
        .cloned()
        .context("configuration has no `system.hostname`")?;

    let patch = json!({
        "system": {
            "dnsserver": ["8.8.8.8", "8.8.4.4"],
            "hostname": "testing"
        }
    });
    print_json(&client.config_patch(&patch).await?)?;

    let restore = json!({
        "system": {
            "dnsserver": original_dnsserver,
            "hostname": original_hostname
        }
    });
    print_json(&client.config_patch(&restore).await?)?;

    print_json(&client.config_get(None).await?)?;
    Ok(())
}

fn function_calls() -> Vec<FunctionCall> {
    let ntpd = || vec![Value::from("ntpd")];
    vec![
        FunctionCall::new("return_gateways_status").with_args(vec![Value::Bool(false)]),
        FunctionCall::new("discover_last_backup"),
        FunctionCall::new("return_gateways_status").with_includes(["gwlb.inc"]),
        FunctionCall::new("return_gateways_status_text")
            .with_args(vec![Value::Bool(true), Value::Bool(false)]),
        FunctionCall::new("get_carp_status"),
        FunctionCall::new("get_dns_servers"),
        FunctionCall::new("pkg_list_repos"),
        FunctionCall::new("get_services"),
        FunctionCall::new("get_service_status").with_args(ntpd()),
        FunctionCall::new("is_service_enabled").with_args(ntpd()),
        FunctionCall::new("is_service_running").with_args(ntpd()),
    ]
}
