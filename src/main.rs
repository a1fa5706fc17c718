//! hubnote - GitHub issue, pull request and search lookups for note-taking tools.
//!
//! This is the command line front end of the `hubnote-github` client. Every
//! lookup prints its result as pretty JSON.
//!
//! Usage:
//!   hubnote issue rust-lang/rust 1234
//!   hubnote issues --repo rust-lang/rust --state open --labels bug,C-crash
//!   hubnote issues --mine --org acme
//!   hubnote search 'repo:rust-lang/rust is:open panic'
//!   hubnote accounts add --name work --orgs acme,acme-labs --token ghp_xxx

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use hubnote_config::persistence::{default_user_config_path, find_config_file};
use hubnote_config::{Config, GithubAccount};
use hubnote_github::GitHubClient;
use hubnote_protocol::{Labels, QueryParams, QueryType};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hubnote", version)]
#[command(about = "Look up GitHub issues, pull requests and searches across accounts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./hubnote.json5 or ~/.config/hubnote/config.json5)
    #[arg(long, env = "HUBNOTE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Ignore cached responses and always query GitHub
    #[arg(long, global = true)]
    skip_cache: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a single issue
    Issue {
        /// Repository as owner/name
        repo: RepoRef,
        number: u64,
    },
    /// Show a single pull request
    Pr {
        /// Repository as owner/name
        repo: RepoRef,
        number: u64,
    },
    /// List issues of a repository, an organization, or your own
    Issues {
        /// Repository as owner/name
        #[arg(long, conflicts_with = "mine")]
        repo: Option<RepoRef>,

        /// Organization to list issues for, or whose account to use with --mine
        #[arg(long)]
        org: Option<String>,

        /// List issues assigned to the account's token owner
        #[arg(long)]
        mine: bool,

        #[command(flatten)]
        list: ListArgs,
    },
    /// List pull requests of a repository
    Pulls {
        /// Repository as owner/name
        repo: RepoRef,

        #[command(flatten)]
        list: ListArgs,
    },
    /// List check runs for a commit SHA, branch or tag
    Checks {
        /// Repository as owner/name
        repo: RepoRef,
        git_ref: String,
    },
    /// Search issues or pull requests
    Search {
        /// Query in GitHub search syntax, e.g. 'repo:o/r is:open crash'
        query: String,

        /// Search pull requests instead of issues
        #[arg(long)]
        prs: bool,

        /// Organization whose account to use
        #[arg(long)]
        org: Option<String>,

        #[arg(long)]
        sort: Option<String>,

        /// Result order, asc or desc
        #[arg(long)]
        order: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        per_page: Option<u8>,
    },
    /// Find the pull request linked to an issue
    LinkedPr {
        /// Repository as owner/name
        repo: RepoRef,
        number: u64,
    },
    /// Manage GitHub accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Args)]
struct ListArgs {
    /// open, closed or all
    #[arg(long)]
    state: Option<String>,

    /// Comma separated label names
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    #[arg(long)]
    sort: Option<String>,

    /// Sort direction, asc or desc
    #[arg(long)]
    direction: Option<String>,

    /// Only issues updated at or after this ISO 8601 timestamp
    #[arg(long)]
    since: Option<String>,

    #[arg(long)]
    assignee: Option<String>,

    #[arg(long)]
    creator: Option<String>,

    #[arg(long)]
    mentioned: Option<String>,

    /// Organization listing filter: assigned, created, mentioned, subscribed, repos or all
    #[arg(long)]
    filter: Option<String>,

    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    per_page: Option<u8>,
}

impl ListArgs {
    fn into_params(self, query_type: QueryType) -> QueryParams {
        QueryParams {
            state: self.state,
            labels: (!self.labels.is_empty()).then_some(Labels::Many(self.labels)),
            sort: self.sort,
            direction: self.direction,
            since: self.since,
            assignee: self.assignee,
            creator: self.creator,
            mentioned: self.mentioned,
            filter: self.filter,
            page: self.page,
            per_page: self.per_page,
            ..QueryParams::new(query_type)
        }
    }
}

#[derive(Subcommand)]
enum AccountCommands {
    /// List configured accounts (tokens are not shown)
    List,
    /// Add an account
    Add {
        #[arg(long)]
        name: String,

        /// Comma separated organizations and users served by this account
        #[arg(long, value_delimiter = ',')]
        orgs: Vec<String>,

        #[arg(long, env = "HUBNOTE_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Remove an account by id
    Remove { id: String },
    /// Make an account the default
    Default { id: String },
}

/// A repository given as `owner/name`.
#[derive(Debug, Clone)]
struct RepoRef {
    owner: String,
    name: String,
}

impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected owner/name, got {s:?}")),
        }
    }
}

/// Initialize tracing with the given verbosity level
///
/// - 0: warn (default)
/// - 1: info (-v)
/// - 2: debug (-vv)
/// - 3+: trace (-vvv)
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // RUST_LOG overrides -v
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Config::load().context("failed to load configuration"),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Accounts { command } = cli.command {
        return run_accounts(cli.config.as_deref(), command);
    }

    let config = load_config(cli.config.as_deref())?;
    let client = GitHubClient::from_config(config)?;
    let skip_cache = cli.skip_cache;

    match cli.command {
        Commands::Issue { repo, number } => {
            print_json(&client.get_issue(&repo.owner, &repo.name, number, skip_cache).await?)
        }
        Commands::Pr { repo, number } => print_json(
            &client
                .get_pull_request(&repo.owner, &repo.name, number, skip_cache)
                .await?,
        ),
        Commands::Issues {
            repo,
            org,
            mine,
            list,
        } => {
            let params = list.into_params(QueryType::Issue);
            let page = match (repo, org) {
                (Some(repo), _) => {
                    client
                        .get_issues_for_repo(&params, &repo.owner, &repo.name, skip_cache)
                        .await?
                }
                (None, Some(org)) if !mine => {
                    client
                        .get_issues_for_organization(&params, &org, skip_cache)
                        .await?
                }
                (None, org) => {
                    client
                        .get_my_issues(&params, org.as_deref(), skip_cache)
                        .await?
                }
            };
            print_json(&page)
        }
        Commands::Pulls { repo, list } => {
            let params = list.into_params(QueryType::PullRequest);
            print_json(
                &client
                    .get_pull_requests_for_repo(&params, &repo.owner, &repo.name, skip_cache)
                    .await?,
            )
        }
        Commands::Checks { repo, git_ref } => print_json(
            &client
                .list_check_runs_for_ref(&repo.owner, &repo.name, &git_ref, skip_cache)
                .await?,
        ),
        Commands::Search {
            query,
            prs,
            org,
            sort,
            order,
            page,
            per_page,
        } => {
            let query_type = if prs {
                QueryType::PullRequest
            } else {
                QueryType::Issue
            };
            let params = QueryParams {
                query: Some(query.into()),
                org,
                sort,
                order,
                page,
                per_page,
                ..QueryParams::new(query_type)
            };
            print_json(&client.search_issues(&params, skip_cache).await?)
        }
        Commands::LinkedPr { repo, number } => {
            let issue = client
                .get_issue(&repo.owner, &repo.name, number, skip_cache)
                .await?;
            let Some(timeline_url) = issue.timeline_url else {
                bail!("issue {}/{}#{number} has no timeline", repo.owner, repo.name);
            };
            let url = client
                .get_pr_for_issue(&timeline_url, Some(repo.owner.as_str()), skip_cache)
                .await?;
            print_json(&json!({ "pull_request": url }))
        }
        Commands::Accounts { .. } => unreachable!("handled before building the client"),
    }
}

/// Returns the file account changes are written to.
fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = find_config_file() {
        return Ok(path);
    }
    Ok(default_user_config_path()?)
}

fn run_accounts(explicit: Option<&Path>, command: AccountCommands) -> Result<()> {
    let path = config_path(explicit)?;
    let mut config = if path.exists() {
        load_config(Some(&path))?
    } else {
        Config::default()
    };

    match command {
        AccountCommands::List => {
            let accounts: Vec<_> = config
                .accounts
                .iter()
                .map(|account| {
                    json!({
                        "id": account.id,
                        "name": account.name,
                        "orgs": account.orgs,
                        "has_token": account.has_token(),
                        "default": config.default_account.as_deref() == Some(account.id.as_str()),
                    })
                })
                .collect();
            return print_json(&accounts);
        }
        AccountCommands::Add { name, orgs, token } => {
            let name = name.trim();
            let token = token.trim();
            if name.is_empty() || token.is_empty() {
                bail!("an account needs a name and a token");
            }
            let orgs = orgs
                .iter()
                .map(|org| org.trim())
                .filter(|org| !org.is_empty());
            let account = GithubAccount::new(name, orgs, token);
            println!("{}", account.id);
            config.add_account(account);
        }
        AccountCommands::Remove { id } => {
            if !config.remove_account(&id) {
                bail!("no account with id {id}");
            }
        }
        AccountCommands::Default { id } => {
            if !config.accounts.iter().any(|account| account.id == id) {
                bail!("no account with id {id}");
            }
            config.default_account = Some(id);
        }
    }

    config.validate()?;
    config.save_to(&path)?;
    debug!(path = %path.display(), "saved configuration");
    Ok(())
}
