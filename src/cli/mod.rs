mod render;
mod report;

use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::services::catalog::{
    author_options, component_options, project_options, DEFAULT_USER_QUERY, USER_SEARCH_LIMIT,
};
use crate::services::{Config, ConfigService, JiraClient};
use crate::types::{Result, SelectOption};

pub use render::render_table;
pub use report::{DetailsArgs, FilterArgs, ReportArgs};

/// Issue-tracker worklog reports: hours per day and days per component
#[derive(Parser)]
#[command(name = "worklog-pivot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the worklog report for a date range (default)
    Report(ReportArgs),

    /// Show the worklogs behind one author and day
    Details(DetailsArgs),

    /// List projects
    Projects {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the components of a project
    Components {
        /// Project id, see `projects`
        #[arg(long)]
        project: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search human user accounts
    Authors {
        /// Name or email fragment
        #[arg(long, default_value = DEFAULT_USER_QUERY)]
        query: String,

        /// Maximum results
        #[arg(long, default_value_t = USER_SEARCH_LIMIT)]
        max: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration (token masked), or store settings
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Tracker site, e.g. https://acme.atlassian.net
    #[arg(long, value_name = "URL")]
    pub site: Option<String>,

    /// Account email for basic auth
    #[arg(long)]
    pub email: Option<String>,

    /// API token for basic auth
    #[arg(long)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Retries of transient request failures
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
}

impl ConfigArgs {
    pub fn has_changes(&self) -> bool {
        self.site.is_some()
            || self.email.is_some()
            || self.token.is_some()
            || self.timeout_secs.is_some()
            || self.max_retries.is_some()
    }

    pub fn apply(self, config: &mut Config) {
        if let Some(site) = self.site {
            config.site_url = Some(site);
        }
        if let Some(email) = self.email {
            config.email = Some(email);
        }
        if let Some(token) = self.token {
            config.api_token = Some(token);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(n) = self.max_retries {
            config.max_retries = n;
        }
    }
}

/// Loaded configuration plus a connected client
pub struct Session {
    pub config: Config,
    pub api: Arc<JiraClient>,
}

impl Session {
    fn open() -> Result<Self> {
        let config = ConfigService::new()?.load()?;
        let api = JiraClient::new(
            config.request_context()?,
            config.request_timeout(),
            config.retry_policy(),
        )?;
        Ok(Self {
            config,
            api: Arc::new(api),
        })
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config(args)) => {
                let service = ConfigService::new()?;
                if args.has_changes() {
                    service.update(|config| args.apply(config))?;
                    eprintln!("Saved {}", service.path().display());
                }
                println!("# {}", service.path().display());
                println!("{}", service.load()?);
                Ok(())
            }
            command => {
                let session = Session::open()?;
                match command {
                    None => ReportArgs::default().run(&session).await?,
                    Some(Commands::Report(args)) => args.run(&session).await?,
                    Some(Commands::Details(args)) => args.run(&session).await?,
                    Some(Commands::Projects { json }) => {
                        print_options(&project_options(session.api.as_ref()).await?, json)?
                    }
                    Some(Commands::Components { project, json }) => print_options(
                        &component_options(session.api.as_ref(), &project).await?,
                        json,
                    )?,
                    Some(Commands::Authors { query, max, json }) => print_options(
                        &author_options(session.api.as_ref(), &query, max).await?,
                        json,
                    )?,
                    Some(Commands::Config(_)) => {}
                }
                Ok(())
            }
        }
    }
}

fn print_options(options: &[SelectOption], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(options)?);
    } else {
        for option in options {
            println!("{}\t{}", option.id, option.label);
        }
    }
    Ok(())
}
