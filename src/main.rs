//! Paper trading session CLI
//!
//! Drives the session controller against the remote backend: start, pause,
//! stop, watch the live snapshot, and browse past sessions.

use clap::{Parser, Subcommand};
use papertrade_client::{
    client::PaperTradingClient,
    config::Config,
    session::{SessionController, SessionPhase},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "papertrade")]
#[command(about = "Paper trading session client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new simulated session
    Start {
        /// Instrument symbol, e.g. PETR4
        ticker: String,
        /// Strategy id to simulate
        #[arg(short, long)]
        strategy: i64,
        /// Initial capital
        #[arg(short = 'i', long, default_value = "100000")]
        capital: Decimal,
    },
    /// Adopt the live session (if any) and print its snapshot on every poll
    Watch,
    /// Pause or resume the live session
    Pause,
    /// Stop the live session
    Stop {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the current session snapshot once
    Status,
    /// List past sessions
    History {
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let api = Arc::new(PaperTradingClient::new(&config.api)?);
    let controller = SessionController::new(api, config.paper_trading.clone());

    match cli.command {
        Commands::Start {
            ticker,
            strategy,
            capital,
        } => start(controller, &ticker, strategy, capital).await,
        Commands::Watch => watch(controller, config.paper_trading.poll_interval_secs).await,
        Commands::Pause => pause(controller).await,
        Commands::Stop { yes } => stop(controller, yes).await,
        Commands::Status => status(controller).await,
        Commands::History { limit } => history(controller, limit).await,
    }
}

async fn start(
    controller: SessionController,
    ticker: &str,
    strategy: i64,
    capital: Decimal,
) -> anyhow::Result<()> {
    controller.start(ticker, strategy, capital).await?;
    print_snapshot(&controller).await;
    controller.teardown();
    Ok(())
}

async fn watch(controller: SessionController, poll_secs: u64) -> anyhow::Result<()> {
    controller.load_active_if_any().await?;

    let view = controller.view().await;
    if view.session.is_none() {
        println!("No live session. Start one with `papertrade start <TICKER> -s <STRATEGY>`.");
        return Ok(());
    }

    tracing::info!("Watching session, Ctrl-C to exit");
    loop {
        print_snapshot(&controller).await;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(poll_secs)) => {}
        }
    }
    controller.teardown();
    Ok(())
}

async fn pause(controller: SessionController) -> anyhow::Result<()> {
    controller.load_active_if_any().await?;
    controller.pause_or_resume().await?;
    let view = controller.view().await;
    println!("Session is now {}", view.phase);
    controller.teardown();
    Ok(())
}

async fn stop(controller: SessionController, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!("Stopping discards the live session (it stays in history).");
        print!("Continue? [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    controller.load_active_if_any().await?;
    controller.stop().await?;
    println!("Session stopped.");
    for entry in controller.history().await.iter().take(5) {
        println!(
            "  #{} {} {} {} -> {} ({:.2}%)",
            entry.id,
            entry.ticker,
            entry.status,
            entry.initial_capital,
            entry.current_capital,
            entry.return_percent()
        );
    }
    Ok(())
}

async fn status(controller: SessionController) -> anyhow::Result<()> {
    controller.load_active_if_any().await?;
    print_snapshot(&controller).await;
    controller.teardown();
    Ok(())
}

async fn history(controller: SessionController, limit: u32) -> anyhow::Result<()> {
    let entries = controller.refresh_history(Some(limit)).await?;
    if entries.is_empty() {
        println!("No past sessions.");
        return Ok(());
    }
    for entry in entries.iter() {
        println!(
            "#{} {} {} started {} capital {} -> {} ({:.2}%)",
            entry.id,
            entry.ticker,
            entry.status,
            entry.started_at.format("%Y-%m-%d %H:%M"),
            entry.initial_capital,
            entry.current_capital,
            entry.return_percent()
        );
    }
    Ok(())
}

async fn print_snapshot(controller: &SessionController) {
    let view = controller.view().await;
    if let Some(error) = &view.last_error {
        eprintln!("! {}", error);
    }
    match (&view.session, view.phase) {
        (None, _) | (_, SessionPhase::Idle) => println!("No live session."),
        (Some(session), phase) => {
            let equity = view
                .current_equity
                .unwrap_or(session.current_capital);
            let ret = view
                .return_percent()
                .unwrap_or(Decimal::ZERO);
            println!(
                "{} [{}] equity {} ({:.2}%) open positions: {}",
                session.ticker,
                phase,
                equity,
                ret,
                view.open_positions.len()
            );
        }
    }
}
