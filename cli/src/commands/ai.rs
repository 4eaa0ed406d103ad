use clap::Subcommand;

use crate::util::{client, print_json};

#[derive(Subcommand)]
pub enum AiCommands {
    /// Check whether scenario generation is configured
    Status,
    /// Generate a batch of synthetic scenarios
    Generate {
        /// How many scenarios to request (1..=20)
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
}

pub async fn run(api_url: &str, command: AiCommands) -> Result<(), Box<dyn std::error::Error>> {
    let resp = match command {
        AiCommands::Status => client().get(format!("{api_url}/v1/ai/status")).send().await?,
        AiCommands::Generate { count } => {
            client()
                .post(format!("{api_url}/v1/ai/generate"))
                .json(&serde_json::json!({ "count": count }))
                .send()
                .await?
        }
    };

    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;

    if !status.is_success() {
        // Generator failures carry the upstream's error text verbatim
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        std::process::exit(1);
    }

    print_json(&body);
    Ok(())
}
