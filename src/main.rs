use clap::{Args, Parser, Subcommand};
use roomwatch::config::{self, AppConfig};
use roomwatch::error::AppError;
use roomwatch::monitor::{Monitor, RunSummary, StateStore};
use roomwatch::notify::TelegramChannel;
use roomwatch::render::HttpRenderer;
use roomwatch::telemetry;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "roomwatch",
    about = "Monitor room availability across booking pages and alert on status changes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one monitoring pass over the configured sites (default command)
    Check(CheckArgs),
    /// Inspect the persisted per-site state
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
}

#[derive(Args, Debug, Default)]
struct CheckArgs {
    /// Override the site-list file path
    #[arg(long)]
    sites: Option<PathBuf>,
    /// Override the state file path
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum StateCommand {
    /// Print the stored status for every known site
    Show {
        /// Override the state file path
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Check(CheckArgs::default()));

    match command {
        Command::Check(args) => run_check(args).await,
        Command::State {
            command: StateCommand::Show { state },
        } => run_state_show(state),
    }
}

async fn run_check(mut args: CheckArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(sites) = args.sites.take() {
        config.sites_file = sites;
    }
    if let Some(state) = args.state.take() {
        config.state_file = state;
    }

    telemetry::init(&config.telemetry)?;

    // Site-list problems are fatal before any page is rendered.
    let sites = config::load_sites(&config.sites_file)?;

    let renderer = HttpRenderer::new(&config.renderer)?;
    let delivery = TelegramChannel::from_config(&config.telegram);
    if !delivery.is_configured() {
        warn!("telegram credentials missing; notifications will be logged and skipped");
    }

    let store = StateStore::new(&config.state_file);
    let monitor = Monitor::new(renderer, delivery, store);
    let summary = monitor.run(&sites).await?;

    render_summary(&summary);
    Ok(())
}

fn run_state_show(state: Option<PathBuf>) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let path = state.unwrap_or(config.state_file);

    let record = StateStore::new(&path).load();
    if record.is_empty() {
        println!("No recorded state in {}", path.display());
        return Ok(());
    }

    println!("Recorded state ({})", path.display());
    for (url, status) in &record {
        println!("- {url}: {status}");
    }
    Ok(())
}

fn render_summary(summary: &RunSummary) {
    println!("Monitoring pass complete");
    println!(
        "Sites checked: {} (available {}, soldout {}, unknown {})",
        summary.checked, summary.available, summary.soldout, summary.unknown
    );

    if summary.render_failures > 0 {
        println!("Render failures: {}", summary.render_failures);
    }

    if summary.notifications.is_empty() {
        println!("Status changes: none");
    } else {
        println!("Status changes");
        for outcome in &summary.notifications {
            let delivery_note = if outcome.delivered {
                "notified"
            } else {
                "notification skipped"
            };
            println!(
                "- {}: {} ➜ {} ({delivery_note})",
                outcome.site_name, outcome.previous, outcome.current
            );
        }
    }
}
