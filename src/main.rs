mod config;
mod controller;
mod duration;
mod error;
mod history;
mod notify;
mod panel;
mod reminder;
mod render;
mod sound;
mod web;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::controller::Controller;
use crate::duration::Interval;
use crate::reminder::{DesktopAlerter, Reminder};
use crate::sound::Sound;

#[derive(Parser)]
#[command(name = "nudge", about = "Recurring desktop reminders", version)]
struct Cli {
    /// What to be reminded about, or a preset name (e.g., break, water)
    task: Option<String>,

    /// Interval between reminders (e.g., 10s, 5m, 1h30m)
    #[arg(short, long)]
    every: Option<String>,

    /// Stop after this many reminders
    #[arg(long)]
    times: Option<u64>,

    /// Suppress the reminder sound
    #[arg(long, global = true)]
    silent: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web UI
    Serve {
        /// Address to listen on (default from config, 127.0.0.1:5000)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Open the interactive terminal form
    Panel,
    /// Show reminder history summary
    Log,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn alerter(config: &Config, silent: bool, echo: bool) -> Arc<DesktopAlerter> {
    Arc::new(DesktopAlerter {
        notify: config.notify_settings(),
        sound: if silent { Sound::Off } else { config.sound() },
        echo,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    // the panel owns the screen, so stay quiet unless RUST_LOG asks otherwise
    init_tracing(match cli.command {
        Some(Commands::Panel) => "off",
        _ => "info",
    });

    let config = Config::load();

    match cli.command.take() {
        Some(Commands::Log) => {
            history::print_summary();
            Ok(())
        }
        Some(Commands::Serve { bind }) => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let state = Arc::new(web::AppState {
                controller: Controller::new(
                    alerter(&config, cli.silent, false),
                    Some(history::history_path()),
                ),
                min_interval_secs: config.min_interval_secs,
            });
            web::serve(state, &bind)
                .await
                .with_context(|| format!("web UI failed on {bind}"))
        }
        Some(Commands::Panel) => {
            let controller = Controller::new(
                alerter(&config, cli.silent, false),
                Some(history::history_path()),
            );
            panel::run(&controller, config.min_interval_secs)
                .await
                .context("terminal panel failed")
        }
        None => run_foreground(&config, cli).await,
    }
}

fn prompt_task() -> anyhow::Result<String> {
    print!("What do you need to be reminded about? ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Resolution order: preset name, then literal task. `--every` beats both intervals.
fn resolve(config: &Config, input: &str, every: Option<&str>) -> anyhow::Result<Reminder> {
    let (task, preset_interval) = match config.resolve_preset(input) {
        Some(preset) => (preset.task.as_str(), Some(preset.interval.as_str())),
        None => (input, None),
    };
    let interval = match every.or(preset_interval) {
        Some(s) => Interval::parse(s)?,
        None => config.default_interval(),
    };
    Ok(Reminder::new(task, interval, config.min_interval_secs)?)
}

async fn run_foreground(config: &Config, cli: Cli) -> anyhow::Result<()> {
    let input = match cli.task {
        Some(t) => t,
        None => prompt_task()?,
    };
    let reminder = resolve(config, &input, cli.every.as_deref())?;

    println!(
        "Okay, I'll remind you about '{}' every {}.",
        reminder.task,
        reminder.interval.human()
    );
    match cli.times {
        Some(n) => println!("Stopping after {n} reminders, or press Ctrl+C to stop sooner."),
        None => println!("This will continue until you press Ctrl+C."),
    }

    let controller = Controller::new(
        alerter(config, cli.silent, true),
        Some(history::history_path()),
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    let sent = controller
        .run_until(reminder, cli.times, shutdown)
        .await
        .map_or(0, |record| record.fires);

    println!();
    println!("Reminder stopped after {sent} reminder{}.", if sent == 1 { "" } else { "s" });
    Ok(())
}
