use chrono::Local;
use clap::{Parser, Subcommand};
use murshid_core::config;
use murshid_engine::SessionEngine;
use murshid_store::Store;
use std::io::{BufRead, Write};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "murshid",
    version,
    about = "Murshid — personal spiritual coaching companion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive coaching session for one user and program day.
    Chat {
        /// User id.
        #[arg(short, long)]
        user: String,
        /// Program day (1-based).
        #[arg(short, long, default_value_t = 1)]
        day: u32,
        /// Print the assembled prompt before each coach turn.
        #[arg(long)]
        show_prompt: bool,
    },
    /// Show a user's progression: level, streak, badges.
    Stats {
        #[arg(short, long)]
        user: String,
    },
    /// Print the stored conversation context for a user and day.
    Context {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value_t = 1)]
        day: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = Arc::new(config::load(&cli.config)?);
    let store = Arc::new(Store::new(&cfg.storage).await?);

    let engine = SessionEngine::new(cfg.clone(), store.clone(), store.clone(), store.clone());

    match cli.command {
        Commands::Chat {
            user,
            day,
            show_prompt,
        } => run_chat(&engine, &user, day, show_prompt).await?,
        Commands::Stats { user } => {
            let progress = engine.ledger().progress_of(&user).await;
            let levels = &cfg.gamification.levels;
            let level = levels.level_of(progress.total_points);
            let ladder = levels.progress(progress.total_points);

            println!("Progress for {user}\n");
            println!(
                "  Level {} — {} ({} points)",
                level.number, level.name, progress.total_points
            );
            match ladder.next {
                Some(next) => println!(
                    "  {}% of the way to {} ({} points to go)",
                    ladder.percent, next.name, ladder.points_needed
                ),
                None => println!("  Top level reached"),
            }
            println!(
                "  Streak: {} day(s) (best {})",
                progress.current_streak, progress.max_streak
            );
            println!("  Sessions: {}", progress.total_sessions);
            println!("  Dhikr recognized: {}", progress.total_dhikr_count);
            println!(
                "  Early-morning sessions: {}",
                progress.early_morning_session_count
            );

            if progress.earned_badges.is_empty() {
                println!("  Badges: none yet");
            } else {
                println!("  Badges:");
                for id in &progress.earned_badges {
                    let label = cfg
                        .gamification
                        .badges
                        .iter()
                        .find(|b| b.id == *id)
                        .map(|b| b.label.as_str())
                        .unwrap_or(id.as_str());
                    println!("    - {label}");
                }
            }
        }
        Commands::Context { user, day } => {
            let context = engine.summarizer().full_context(&user, day).await;
            println!("{}", context.to_prompt_string());
        }
    }

    Ok(())
}

/// Manual coaching console. Each user line runs the full per-message
/// pipeline; the operator then types the coach reply, which is appended to
/// the journal the way the streaming transport would after generation.
async fn run_chat(
    engine: &SessionEngine,
    user: &str,
    day: u32,
    show_prompt: bool,
) -> anyhow::Result<()> {
    println!("Murshid — day {day} session for {user} (Ctrl-D or /quit to end)\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let text = line?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        let now = Local::now().naive_local();
        let outcome = match engine.handle_message(user, day, text, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };

        if outcome.points_awarded > 0 {
            println!("  +{} points", outcome.points_awarded);
        }
        for id in &outcome.new_badges {
            let label = engine
                .config()
                .gamification
                .badges
                .iter()
                .find(|b| b.id == *id)
                .map(|b| b.label.clone())
                .unwrap_or_else(|| id.to_string());
            println!("  badge unlocked: {label}");
        }

        if show_prompt {
            println!(
                "\n--- prompt ---\n{}\n--------------",
                outcome.context.to_prompt_string()
            );
        }

        print!("coach> ");
        std::io::stdout().flush()?;
        let Some(reply) = lines.next() else { break };
        let reply = reply?;
        let reply = reply.trim();
        if !reply.is_empty() {
            engine
                .record_reply(user, day, reply, Local::now().naive_local())
                .await?;
        }
    }

    println!("\nSession closed.");
    Ok(())
}
