mod run;
mod schedule;

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use nufood_core::{AppConfig, MemoryStore, MenuStore, StrategyKind};
use tracing_subscriber::EnvFilter;

use crate::run::{LiveStrategies, Operation, RunContext};

#[derive(Debug, Parser)]
#[command(name = "nufood")]
#[command(about = "Campus dining menu and hours ingestion")]
struct Cli {
    /// Acquisition strategy: direct, browser_api or render.
    #[arg(long, global = true)]
    strategy: Option<StrategyKind>,

    /// Strategy to retry with after an anti-bot challenge or a total wipeout.
    #[arg(long, global = true)]
    fallback: Option<StrategyKind>,

    /// Per-location attempt budget; overrides the configured budget.
    #[arg(long, global = true)]
    attempts: Option<u32>,

    /// Half-width of the rolling window in days.
    #[arg(long, global = true)]
    window: Option<u32>,

    /// Scrape into an in-memory store and print the result without touching the database.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild the whole rolling window around a date.
    Rebuild {
        /// Window center (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Slide the window forward by one day.
    Advance {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Refresh the single-day menu table.
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Refresh the operating hours of the week containing a date.
    Hours {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run the daily jobs on a cron schedule until interrupted.
    Schedule {
        /// Cron expression (with seconds) for advance + today.
        #[arg(long, env = "NUFOOD_ADVANCE_CRON", default_value = schedule::DEFAULT_ADVANCE_CRON)]
        advance_cron: String,
        /// Cron expression (with seconds) for the hours refresh.
        #[arg(long, env = "NUFOOD_HOURS_CRON", default_value = schedule::DEFAULT_HOURS_CRON)]
        hours_cron: String,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let options = cli_options(&cli);
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = nufood_core::load_app_config().context("failed to load configuration")?;
    init_tracing(&config);

    match command {
        Commands::Rebuild { date } => run_operation(&options, config, Operation::Rebuild, date).await,
        Commands::Advance { date } => run_operation(&options, config, Operation::Advance, date).await,
        Commands::Today { date } => run_operation(&options, config, Operation::Today, date).await,
        Commands::Hours { date } => run_operation(&options, config, Operation::Hours, date).await,
        Commands::Schedule {
            advance_cron,
            hours_cron,
        } => {
            let attempts = options.attempts.unwrap_or(config.batch_max_attempts);
            let ctx = build_context(&options, config, attempts).await?;
            schedule::run(Arc::new(ctx), &advance_cron, &hours_cron).await
        }
        Commands::Db { command } => run_db(&config, command).await,
    }
}

/// Global flags, detached from the parsed subcommand.
#[derive(Debug, Clone, Copy)]
struct CliOptions {
    strategy: Option<StrategyKind>,
    fallback: Option<StrategyKind>,
    attempts: Option<u32>,
    window: Option<u32>,
    dry_run: bool,
}

fn cli_options(cli: &Cli) -> CliOptions {
    CliOptions {
        strategy: cli.strategy,
        fallback: cli.fallback,
        attempts: cli.attempts,
        window: cli.window,
        dry_run: cli.dry_run,
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!config.env.is_production())
        .init();
    tracing::debug!(env = %config.env, "tracing initialised");
}

async fn build_context(options: &CliOptions, mut config: AppConfig, attempts: u32) -> anyhow::Result<RunContext> {
    if let Some(window) = options.window {
        config.window_days = window;
    }

    let locations = nufood_core::load_locations(&config.locations_path)
        .with_context(|| format!("failed to load locations from {}", config.locations_path.display()))?
        .locations;

    let (store, dry_run_store): (Arc<dyn MenuStore>, _) = if options.dry_run {
        let memory = Arc::new(MemoryStore::new());
        (Arc::clone(&memory) as Arc<dyn MenuStore>, Some(memory))
    } else {
        let pool = nufood_db::connect_pool_from_config(&config)
            .await
            .context("failed to connect to database")?;
        (Arc::new(nufood_db::PgMenuStore::new(pool)) as Arc<dyn MenuStore>, None)
    };

    Ok(RunContext {
        strategy: options.strategy.unwrap_or(config.strategy),
        fallback: options.fallback,
        max_attempts: attempts,
        locations,
        store,
        dry_run_store,
        strategies: Arc::new(LiveStrategies),
        config,
    })
}

async fn run_operation(
    options: &CliOptions,
    config: AppConfig,
    operation: Operation,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let attempts = options.attempts.unwrap_or(config.interactive_max_attempts);
    let ctx = build_context(options, config, attempts).await?;
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let summary = run::execute(&ctx, operation, date)
        .await
        .with_context(|| format!("{} failed for {date}", operation.as_str()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(memory) = &ctx.dry_run_store {
        tracing::info!(
            menu_items = memory.menu_items().len(),
            weekly_entries = memory.weekly_entries().len(),
            unique_names = memory.unique_names().len(),
            hours_locations = memory.operating_hours().len(),
            "dry run: nothing written to the database"
        );
    }
    Ok(())
}

async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = nufood_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to database")?;

    match command {
        DbCommands::Ping => {
            nufood_db::ping(&pool).await.context("database ping failed")?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = nufood_db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            println!("applied {applied} migration(s)");
        }
    }

    pool.close().await;
    Ok(())
}
