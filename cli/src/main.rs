use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;
mod store;
mod util;

use commands::ai::AiCommands;
use commands::review::ReviewCommands;
use commands::scenario::ScenarioCommands;
use util::{client, exit_error, print_json};

#[derive(Parser)]
#[command(
    name = "crux",
    version,
    about = "Crux expert review CLI — structured judgment capture for synthetic climbing scenarios"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "CRUX_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Your expert id (UUID)
    #[arg(long, env = "CRUX_EXPERT_ID")]
    expert_id: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Browse and author scenarios
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommands,
    },
    /// The expert review panel
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Scenario generation
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Degraded-path warnings from the review core go to stderr; stdout stays JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Health => health(&cli.api_url).await,
        Commands::Scenario { command } => commands::scenario::run(&cli.api_url, command).await,
        Commands::Review { command } => {
            let expert_id = cli.expert_id.unwrap_or_else(|| {
                exit_error(
                    "expert_id is required for review operations",
                    Some("Set --expert-id or the CRUX_EXPERT_ID env var"),
                );
            });
            commands::review::run(&cli.api_url, expert_id, command).await
        }
        Commands::Ai { command } => commands::ai::run(&cli.api_url, command).await,
    };

    if let Err(e) = result {
        exit_error(&e.to_string(), None);
    }
}

async fn health(api_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let resp = client().get(format!("{api_url}/health")).send().await?;
    let body: serde_json::Value = resp.json().await?;
    print_json(&body);
    Ok(())
}
