mod cli;
mod core;

use clap::{Args, Parser, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{detect_color, OutputFormat, OutputOptions};
use crate::cli::report_cmd::ReportArgs;
use crate::core::config::AppConfig;
use crate::core::timeframe::{parse_date, Timeframe};

#[derive(Parser)]
#[command(name = "calldash", about = "Call-center campaign dashboard CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text|json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Default)]
struct RangeArgs {
    /// Timeframe (live|yesterday|last-7-days|last-30-days|custom)
    #[arg(short, long, value_parser = parse_timeframe)]
    timeframe: Option<Timeframe>,

    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    start: Option<chrono::NaiveDate>,

    /// Last day of a custom range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    end: Option<chrono::NaiveDate>,

    /// Campaign code (default from config)
    #[arg(short, long)]
    campaign: Option<String>,
}

impl From<RangeArgs> for ReportArgs {
    fn from(args: RangeArgs) -> Self {
        ReportArgs {
            timeframe: args.timeframe,
            start: args.start,
            end: args.end,
            campaign: args.campaign,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the report for a timeframe once
    Report(RangeArgs),
    /// Keep the dashboard on screen, refreshing live data
    Watch(RangeArgs),
    /// Show the account balance
    Balance,
    /// List balance payments and deductions
    History {
        /// Records per page
        #[arg(short, long, default_value_t = 50)]
        limit: u32,

        /// Records to skip
        #[arg(short, long, default_value_t = 0)]
        offset: u32,

        /// Show recharge and deduction totals instead of the ledger
        #[arg(short, long)]
        stats: bool,
    },
    /// Show connected calls over time
    Chart {
        /// Bucket (hour|day|week|month|15min|30min|1hour)
        #[arg(short, long, default_value = "day")]
        bucket: String,

        /// Campaign code (default from config)
        #[arg(short, long)]
        campaign: Option<String>,
    },
    /// Check that the backend is reachable and who is logged in
    Status,
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: String,

        /// Password (falls back to CALLDASH_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print config and session file locations
    Path,
}

fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    Timeframe::from_id(s).ok_or_else(|| {
        format!(
            "unknown timeframe '{}' (live|yesterday|last-7-days|last-30-days|custom)",
            s
        )
    })
}

fn parse_day(s: &str) -> Result<chrono::NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match AppConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    core::logging::init(&config.settings.log_level, cli.verbose);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "falling back to default config");
    }

    let output_opts = OutputOptions {
        format: if cli.json {
            OutputFormat::Json
        } else {
            cli.format
                .as_deref()
                .or(Some(config.settings.default_format.as_str()))
                .and_then(OutputFormat::from_id)
                .unwrap_or(OutputFormat::Text)
        },
        pretty: cli.pretty,
        use_color: detect_color(!cli.no_color, &config.settings.color),
    };

    match cli.command.unwrap_or(Commands::Report(RangeArgs::default())) {
        Commands::Config { action } => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
            ConfigAction::Path => cli::config_cmd::path(&output_opts)?,
        },
        command => {
            let ctx = AppContext::load(config)?;
            dispatch(command, &ctx, &output_opts).await?;
        }
    }

    Ok(())
}

async fn dispatch(command: Commands, ctx: &AppContext, opts: &OutputOptions) -> anyhow::Result<()> {
    match command {
        Commands::Report(args) => cli::report_cmd::run(args.into(), ctx, opts).await,
        Commands::Watch(args) => cli::watch_cmd::run(args.into(), ctx, opts).await,
        Commands::Balance => cli::account_cmd::balance(ctx, opts).await,
        Commands::History {
            limit,
            offset,
            stats,
        } => cli::account_cmd::history(limit, offset, stats, ctx, opts).await,
        Commands::Chart { bucket, campaign } => {
            cli::account_cmd::chart(&bucket, campaign.as_deref(), ctx, opts).await
        }
        Commands::Status => cli::account_cmd::status(ctx, opts).await,
        Commands::Login { username, password } => {
            cli::account_cmd::login(&username, password, ctx, opts).await
        }
        Commands::Logout => cli::account_cmd::logout(ctx, opts),
        Commands::Config { .. } => Ok(()),
    }
}
