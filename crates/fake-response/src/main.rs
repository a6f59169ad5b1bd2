//! Fake response configuration tool.
//!
//! Usage:
//!   fake-response validate --config fake-responses.yaml
//!   fake-response check --config fake-responses.yaml --client payments \
//!       --uri /v1/items -H "X-Fake-Response: gone"

use anyhow::Context;
use clap::{Parser, Subcommand};
use fake_response::config::Config;
use fake_response::options;
use fake_response::StaticHeaders;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::process::ExitCode;
use std::sync::Arc;
use tower::{service_fn, Layer, ServiceExt};
use tracing::{debug, error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fake-response")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a configuration file
    Validate {
        #[arg(short, long, env = "FAKE_RESPONSE_CONFIG")]
        config: String,
    },

    /// Show what a client would answer for a request
    Check {
        #[arg(short, long, env = "FAKE_RESPONSE_CONFIG")]
        config: String,

        /// Client name in the configuration
        #[arg(long)]
        client: String,

        /// Outbound request URI
        #[arg(short, long, default_value = "/")]
        uri: String,

        /// Inbound request header, as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Evaluate as if no inbound request was in scope
        #[arg(long)]
        no_context: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header '{raw}' is not in 'Name: value' form"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn validate(path: &str) -> anyhow::Result<()> {
    let config = Config::from_file(path)?;
    let rules: usize = config.clients.values().map(Vec::len).sum();
    info!(path = %path, clients = config.clients.len(), rules, "configuration is valid");

    println!("production: {}", config.production);
    for (client, rules) in &config.clients {
        println!("{client}:");
        for (index, rule) in rules.iter().enumerate() {
            let header = rule
                .header
                .name
                .as_deref()
                .or(config.header_name.as_deref())
                .unwrap_or_default();
            let label = rule.name.as_deref().unwrap_or("-");
            let path = if rule.path.is_empty() { "*" } else { rule.path.as_str() };
            println!(
                "  #{index} {label}: {header}={} path={path} -> {}",
                rule.header.value, rule.status
            );
        }
    }
    Ok(())
}

/// Marks responses produced by the stand-in transport.
#[derive(Debug, Clone, Copy)]
struct Passthrough;

async fn check(
    path: &str,
    client: &str,
    uri: &str,
    headers: &[String],
    no_context: bool,
) -> anyhow::Result<()> {
    let config = Config::from_file(path)?;
    config.apply();
    if options::is_production_environment() {
        println!("passthrough (production environment)");
        return Ok(());
    }

    let registry = config.build_registry()?;
    debug!(registry = ?registry, "built registry");

    let source = if no_context {
        StaticHeaders::absent()
    } else {
        let pairs = headers
            .iter()
            .map(|raw| parse_header(raw))
            .collect::<anyhow::Result<Vec<_>>>()?;
        StaticHeaders::from_pairs(pairs)
    };

    let Some(layer) = registry.layer_for(client, Arc::new(source)) else {
        println!("passthrough (no rules for client '{client}')");
        return Ok(());
    };

    let transport = service_fn(|_req: Request<()>| async {
        let mut response = Response::new(String::new());
        response.extensions_mut().insert(Passthrough);
        Ok::<_, Infallible>(response)
    });

    let request = Request::builder()
        .uri(uri)
        .body(())
        .with_context(|| format!("invalid uri '{uri}'"))?;

    let response = layer.layer(transport).oneshot(request).await?;
    if response.extensions().get::<Passthrough>().is_some() {
        println!("passthrough");
    } else {
        println!("fake {} {}", response.status().as_u16(), response.body());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Command::Validate { config } => validate(&config),
        Command::Check {
            config,
            client,
            uri,
            headers,
            no_context,
        } => check(&config, &client, &uri, &headers, no_context).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
