// src/main.rs
use atg_gateway::{
    Command, CommandRequest, GatewayClient, GatewayConfig, GatewayError, RunCommandParams,
    RunCommandSubscription, WsTransport, banner,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "atg", version, about = "Client for the code execution & test report gateway")]
struct AppCli {
    /// TOML config file; falls back to ATG_* environment variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit code and print the submission id
    Submit {
        #[arg(long)]
        language: String,
        /// File holding the schema
        #[arg(long)]
        schema: PathBuf,
        /// File holding the code
        #[arg(long)]
        code: PathBuf,
    },
    /// Run one command and print the response envelope
    Run {
        submission_id: String,
        /// e.g. FETCH_TEST_SETS, FETCH_TEST, CURL
        command: String,
        /// Command parameter as name=value; repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Stream a command live until the server completes it
    Watch {
        submission_id: String,
        command: String,
        #[arg(long)]
        test_set_name: Option<String>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> ExitCode {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = AppCli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: AppCli) -> atg_gateway::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::from_env()?,
    };
    info!("Using gateway {}", config.endpoint);

    match cli.command {
        Commands::Submit {
            language,
            schema,
            code,
        } => {
            let schema = std::fs::read_to_string(schema)?;
            let code = std::fs::read_to_string(code)?;
            let client = GatewayClient::from_config(config)?;
            let id = client.try_submit_code(&language, &schema, &code).await?;
            println!("{}", id);
        }
        Commands::Run {
            submission_id,
            command,
            params,
        } => {
            let command: Command = command.parse()?;
            let request = params
                .into_iter()
                .fold(CommandRequest::new(command, submission_id), |request, (name, value)| {
                    request.param(name, value)
                });

            let client = GatewayClient::from_config(config)?;
            let response = client.run_command(request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Watch {
            submission_id,
            command,
            test_set_name,
        } => {
            let mut params = RunCommandParams::new(submission_id, command);
            if let Some(name) = test_set_name {
                params = params.test_set_name(name);
            }

            let transport = WsTransport::new(config.ws_endpoint.clone());
            let mut subscription = RunCommandSubscription::new(transport, params);
            subscription.handle_submit().await;

            while let Some(state) = subscription.next_update().await {
                println!("{}", serde_json::to_string(state)?);
            }

            if let Some(error) = &subscription.state().error {
                return Err(GatewayError::Subscription(error.clone()));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
