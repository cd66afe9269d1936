use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::command_logic::{browse::browse, list::list_tags};
use crate::config::{validate_url, Config};
use crate::constants::Message;
use crate::external_api::{tags_api::TagsApi, ApiError};
use crate::utils::resolve_config_path;
use crate::view::route_state::{RouteState, RouteStore, RouteUpdate};

#[derive(Parser)]
#[command(
    name = "tagview",
    version,
    about = "Terminal browser for a paginated tags API",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Path to the config file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
    /// Url of the tags API
    #[arg(long, global = true, value_parser = validate_base_url)]
    pub base_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of tags
    List(LocationArgs),
    /// Browse tags interactively
    Browse(LocationArgs),
    /// Create the config file
    Init,
}

#[derive(Args)]
pub struct LocationArgs {
    /// Location to open, e.g. "?page=2&filter=music"
    #[arg(long, short)]
    pub location: Option<String>,
    /// Filter by tag title
    #[arg(long, short)]
    pub filter: Option<String>,
    /// Page number
    #[arg(long, short, value_parser = validate_page)]
    pub page: Option<u32>,
}

impl LocationArgs {
    /// Location first, explicit `--filter`/`--page` on top of it
    pub fn route(&self) -> RouteState {
        let route = self
            .location
            .as_deref()
            .map(RouteState::from_query)
            .unwrap_or_default();
        route.apply(&RouteUpdate { filter: self.filter.clone(), page: self.page })
    }
}

fn validate_page(value: &str) -> Result<u32, ApiError> {
    let page: u32 = value.parse().map_err(|_| ApiError::Parse(value.to_string()))?;
    if page == 0 {
        return Err(ApiError::PageMustBePositive)
    }
    Ok(page)
}

fn validate_base_url(value: &str) -> Result<String, ApiError> {
    validate_url(value.to_string())
}

fn load_config(config_path: &Path, base_url: Option<String>) -> Result<Config, ApiError> {
    let config = Config::load_or_default(config_path)?
        .with_overrides(Config::env_base_url(), base_url)?;
    debug!(?config, "Loaded config");
    Ok(config)
}

pub async fn handle_command(cli: Cli) -> Result<(), ApiError> {
    let config_path = resolve_config_path(cli.config)?;
    match cli.command {
        Commands::Init => {
            let config = Config::new(std::io::stdin().lock(), std::io::stdout())?;
            config.save(&config_path)?;
            println!(
                "{}",
                Message::ConfigSaved(config_path.display().to_string()).to_formatted_string()
            );
        }
        Commands::List(args) => {
            let config = load_config(&config_path, cli.base_url)?;
            let tags_api = TagsApi::new(&config.base_url, config.request_timeout())?;
            println!("{}", list_tags(&args.route(), &tags_api).await?);
        }
        Commands::Browse(args) => {
            let config = load_config(&config_path, cli.base_url)?;
            let tags_api = TagsApi::new(&config.base_url, config.request_timeout())?;
            browse(
                RouteStore::new(args.route()),
                Arc::new(tags_api),
                &config,
                tokio::io::BufReader::new(tokio::io::stdin()),
                std::io::stdout(),
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[rstest]
    #[case(&["tagview", "list", "-l", "?page=2&filter=music"], "music", 2)]
    #[case(&["tagview", "list", "--filter", "rock", "--page", "3"], "rock", 3)]
    #[case(&["tagview", "list", "-l", "?page=2&filter=music", "-p", "5"], "music", 5)]
    #[case(&["tagview", "list", "-l", "?page=4&filter=music", "-f", "jazz"], "jazz", 4)]
    #[case(&["tagview", "list"], "", 1)]
    fn test_list_command_route(#[case] args: &[&str], #[case] filter: &str, #[case] page: u32) {
        let cli = Cli::parse_from(args);
        match cli.command {
            Commands::List(value) => assert_eq!(value.route(), RouteState::new(filter, page)),
            _ => panic!("expected the list command"),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::parse_from([
            "tagview", "browse", "-vv", "--base-url", "http://tags.local/", "-c", "/tmp/c.json",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.base_url.as_deref(), Some("http://tags.local"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(cli.command, Commands::Browse(_)));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = Cli::try_parse_from(["tagview", "list", "--base-url", "tags.local"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_page_equal_zero() {
        let result = validate_page("0");
        assert!(matches!(result.unwrap_err(), ApiError::PageMustBePositive));
    }

    #[rstest]
    #[case("")]
    #[case("@")]
    #[case("-1")]
    #[case("4294967296")]
    fn test_validate_page_parse_error(#[case] value: String) {
        let result = validate_page(&value);
        assert!(matches!(result.unwrap_err(), ApiError::Parse(_)));
    }
}
