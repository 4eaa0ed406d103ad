use clap::Subcommand;
use uuid::Uuid;

use crate::util::{client, print_json, read_json_from_file};

#[derive(Subcommand)]
pub enum ScenarioCommands {
    /// List scenarios, newest first
    List {
        /// Filter by review status (pending, in_review, ...)
        #[arg(long)]
        status: Option<String>,
        /// Maximum number of scenarios to return
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one scenario in full
    Show {
        /// Scenario id
        #[arg(long)]
        id: Uuid,
    },
    /// Author a scenario from a JSON file (use '-' for stdin)
    Create {
        /// File with description, difficulty_level, tags and both snapshots
        #[arg(long, short = 'f')]
        file: String,
    },
}

pub async fn run(
    api_url: &str,
    command: ScenarioCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ScenarioCommands::List { status, limit } => {
            let mut url = format!("{api_url}/v1/scenarios");
            let mut params = Vec::new();
            if let Some(s) = status {
                params.push(format!("status={s}"));
            }
            if let Some(l) = limit {
                params.push(format!("limit={l}"));
            }
            if !params.is_empty() {
                url = format!("{}?{}", url, params.join("&"));
            }

            let resp = client().get(&url).send().await?;
            finish(resp).await
        }
        ScenarioCommands::Show { id } => {
            let resp = client()
                .get(format!("{api_url}/v1/scenarios/{id}"))
                .send()
                .await?;
            finish(resp).await
        }
        ScenarioCommands::Create { file } => {
            let body = read_json_from_file(&file)?;
            let resp = client()
                .post(format!("{api_url}/v1/scenarios"))
                .json(&body)
                .send()
                .await?;
            finish(resp).await
        }
    }
}

async fn finish(resp: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;

    if !status.is_success() {
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        std::process::exit(1);
    }

    print_json(&body);
    Ok(())
}
