mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use performline_lib::{Client, ClientConfig, PerformLineError};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "performline")]
#[command(about = "PerformLine compliance API client utility")]
struct Cli {
    /// The API key to use for authentication
    #[arg(short = 'k', long, env = "PERFORMLINE_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// The URL of the PerformLine API service
    #[arg(long, env = "PERFORMLINE_API_URL", global = true)]
    api_host: Option<String>,

    /// A string to prefix API endpoint paths with
    #[arg(long, env = "PERFORMLINE_API_PREFIX", global = true)]
    api_endpoint_prefix: Option<String>,

    /// Logging verbosity: debug, info, warning, error
    #[arg(short = 'L', long, env = "PERFORMLINE_LOGLEVEL", default_value = "warning", global = true)]
    log_level: String,

    /// Output format: yaml, json or table
    #[arg(short = 'f', long, default_value = "yaml", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Brands associated with your account
    Brands(commands::common::BrandsArgs),
    /// Information on campaigns
    Campaigns(commands::common::CampaignsArgs),
    /// Information on rules
    Rules(commands::common::RulesArgs),
    /// Information on traffic sources
    Sources(commands::common::SourcesArgs),
    /// Scored content across every product
    Items(commands::common::ItemsArgs),
    /// List the remediation statuses an item can have
    Statuses,
    /// Web pages
    Pages(commands::products::PagesArgs),
    /// Call center calls
    Calls(commands::products::CallsArgs),
    /// ChatScout chats
    Chats(commands::products::ChatsArgs),
    /// Print every brand with its campaigns and scored items
    Tree(commands::tree::TreeArgs),
}

/// Maps the CLI's level names onto `tracing` directives.
fn level_directive(level: &str) -> Result<&'static str> {
    match level.to_ascii_lowercase().as_str() {
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warning" | "warn" => Ok("warn"),
        "error" => Ok("error"),
        other => anyhow::bail!("unknown log level '{}'", other),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level_directive(level)?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn build_client(cli: &Cli) -> Result<Client> {
    let mut config = ClientConfig::from_env()?;
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key);
    }
    if let Some(host) = &cli.api_host {
        config = config.with_url(host);
    }
    if let Some(prefix) = &cli.api_endpoint_prefix {
        config = config.with_prefix(prefix);
    }
    Ok(Client::from_config(&config)?)
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;
    let format: OutputFormat = cli.format.parse()?;
    let client = build_client(&cli)?;

    match &cli.command {
        Commands::Brands(args) => commands::common::run_brands(args, &client, &format).await?,
        Commands::Campaigns(args) => commands::common::run_campaigns(args, &client, &format).await?,
        Commands::Rules(args) => commands::common::run_rules(args, &client, &format).await?,
        Commands::Sources(args) => commands::common::run_sources(args, &client, &format).await?,
        Commands::Items(args) => commands::common::run_items(args, &client, &format).await?,
        Commands::Statuses => commands::common::run_statuses(&client, &format).await?,
        Commands::Pages(args) => commands::products::run_pages(args, &client, &format).await?,
        Commands::Calls(args) => commands::products::run_calls(args, &client, &format).await?,
        Commands::Chats(args) => commands::products::run_chats(args, &client, &format).await?,
        Commands::Tree(args) => commands::tree::run(args, &client).await?,
    }

    Ok(())
}

/// One-line description of a failure for stderr.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<PerformLineError>().and_then(|e| e.response()) {
        Some(response) => format!(
            "The PerformLine API encountered an error: {}",
            response.message()
        ),
        None => format!("Error: {}", err),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}", describe(&e));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_levels() {
        assert_eq!(level_directive("warning").unwrap(), "warn");
        assert_eq!(level_directive("DEBUG").unwrap(), "debug");
        assert!(level_directive("verbose").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "performline",
            "brands",
            "show",
            "42",
            "-f",
            "json",
            "-k",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.format, "json");
        assert_eq!(cli.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn describe_api_errors() {
        let api = performline_lib::performline_api::Error::NotFound(
            performline_lib::ErrorResponse::synthesized(404, Default::default(), "Not found"),
        );
        let err = anyhow::Error::from(PerformLineError::from(api));
        assert_eq!(
            describe(&err),
            "The PerformLine API encountered an error: Not found"
        );

        let err = anyhow::anyhow!("boom");
        assert_eq!(describe(&err), "Error: boom");
    }
}
