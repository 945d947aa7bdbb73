/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Simulated auth sessions, decoded redirect results, origin checks
[POS]:    Binary entry point
[UPDATE]: When changing CLI subcommands, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wallet_auth_core::{BridgeConfig, MessageReceiver, decode_redirect_result};
use wallet_auth_harness::{Scenario, ScenarioOptions, run_scenario};

#[derive(Parser, Debug)]
#[command(name = "wallet-auth-harness", version, about = "Wallet auth bridge simulator")]
struct Cli {
    /// YAML config; WALLET_AUTH_* variables override it
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one auth session against a simulated host window
    Simulate {
        #[arg(long, value_enum, default_value_t = Scenario::Popup)]
        scenario: Scenario,
        /// Host callback URL passed as `returnUrl`
        #[arg(long = "return-url")]
        return_url: Option<String>,
        /// Sign with a real EVM key instead of the mock wallet
        #[arg(long = "private-key", env = "WALLET_AUTH_PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,
        #[arg(long = "chain-id", default_value_t = 1)]
        chain_id: u64,
        /// Make the mock wallet fail to connect with this error text
        #[arg(long = "fail-connect")]
        fail_connect: Option<String>,
        /// Make the mock wallet fail to sign with this error text
        #[arg(long = "fail-sign")]
        fail_sign: Option<String>,
    },
    /// Decode the result carried by a redirect URL
    Decode { url: String },
    /// Check whether a host origin would be accepted
    CheckOrigin {
        #[arg(long)]
        origin: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Simulate {
            scenario,
            return_url,
            private_key,
            chain_id,
            fail_connect,
            fail_sign,
        } => {
            let config = load_config(args.config_path.as_ref())?;
            info!(app_name = %config.app_name, ?scenario, "configuration loaded");

            let options = ScenarioOptions {
                scenario,
                return_url,
                private_key,
                chain_id,
                fail_connect,
                fail_sign,
            };
            let shutdown = CancellationToken::new();
            setup_signal_handlers(shutdown.clone());

            let report = run_scenario(&config, &options, shutdown)
                .await
                .context("run scenario")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Decode { url } => {
            let payload = decode_redirect_result(&url).context("decode redirect url")?;
            println!("{}", payload.to_json()?);
        }
        Command::CheckOrigin { origin } => {
            let config = load_config(args.config_path.as_ref())?;
            let receiver = MessageReceiver::new(config.origin_policy(), config.deployment);
            let accepted = receiver
                .accept(&origin, &json!({ "type": "WALLET_AUTH_INIT" }))
                .is_some();
            println!(
                "{}",
                json!({
                    "origin": origin,
                    "deployment": config.deployment,
                    "allowedOrigins": config.origin_policy().to_string(),
                    "accepted": accepted,
                })
            );
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<BridgeConfig> {
    BridgeConfig::load(path.map(PathBuf::as_path)).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    cancel_on_signal("SIGINT", shutdown.clone(), tokio::signal::ctrl_c());

    #[cfg(unix)]
    cancel_on_signal("SIGTERM", shutdown, async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())?.recv().await;
        Ok::<(), std::io::Error>(())
    });
}

fn cancel_on_signal<F>(
    name: &'static str,
    shutdown: CancellationToken,
    received: F,
) -> JoinHandle<()>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match received.await {
            Ok(()) => {
                info!(signal = name, "received shutdown signal");
                shutdown.cancel();
            }
            Err(err) => warn!(signal = name, error = %err, "failed to install signal handler"),
        }
    })
}
