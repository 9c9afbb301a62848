//! Service Onboarding CLI
//!
//! Adds a service to the Traefik dynamic config, creates its Cloudflare
//! CNAME and grants it single-factor access in Authelia.
//!
//! # Usage
//! ```bash
//! # Credentials come from .env or the environment
//! service-onboard /opt/traefik/dynamic/config.yml
//!
//! # Skip the prompts
//! service-onboard config.yml --service grafana --ip 10.0.0.5:3000 --scheme http
//!
//! # Traefik and Cloudflare only
//! service-onboard config.yml --skip-authelia
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use service_onboard::config::{API_TOKEN_VAR, DOMAIN_VAR, ZONE_ID_VAR};
use service_onboard::onboard::{self, AutheliaPaths, OnboardOptions};
use service_onboard::prompt::{Answers, Prompter};
use service_onboard::{authelia, CloudflareClient, Settings};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser, Debug)]
#[command(name = "service-onboard")]
#[command(about = "Expose a homelab service through Traefik, Cloudflare and Authelia", long_about = None)]
#[command(version)]
struct Cli {
    /// Traefik dynamic configuration file to update
    config: PathBuf,

    /// Cloudflare API token
    #[arg(long, env = API_TOKEN_VAR, hide_env_values = true)]
    api_token: Option<String>,

    /// Cloudflare zone ID
    #[arg(long, env = ZONE_ID_VAR)]
    zone_id: Option<String>,

    /// Base domain, e.g. example.com
    #[arg(long, env = DOMAIN_VAR)]
    domain: Option<String>,

    /// Directory for Traefik config backups
    #[arg(long, default_value = "./backups")]
    backup_dir: PathBuf,

    /// Authelia configuration file
    #[arg(long, default_value = authelia::DEFAULT_CONFIG_PATH)]
    authelia_config: PathBuf,

    /// Directory for Authelia config backups
    #[arg(long, default_value = authelia::DEFAULT_BACKUP_DIR)]
    authelia_backup_dir: PathBuf,

    /// Do not touch the Authelia configuration
    #[arg(long)]
    skip_authelia: bool,

    /// Service name (prompted if omitted)
    #[arg(long)]
    service: Option<String>,

    /// Backend IP address or host (prompted if omitted)
    #[arg(long)]
    ip: Option<String>,

    /// Backend scheme, http or https (prompted if omitted)
    #[arg(long)]
    scheme: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads the environment
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let settings = Settings::from_values(cli.api_token, cli.zone_id, cli.domain)?;
    debug!(?settings, "Settings loaded");

    let options = OnboardOptions {
        routing_config: cli.config,
        backup_dir: cli.backup_dir,
        authelia: (!cli.skip_authelia).then(|| AutheliaPaths {
            config: cli.authelia_config,
            backup_dir: cli.authelia_backup_dir,
        }),
    };
    let answers = Answers {
        name: cli.service,
        address: cli.ip,
        scheme: cli.scheme,
    };

    let cloudflare = CloudflareClient::new(settings.api_token.clone(), settings.zone_id.clone())?;

    let stdin = std::io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());

    let report = onboard::run(&settings, &options, &mut prompter, answers, &cloudflare).await?;
    debug!(?report, "Onboarding finished");

    Ok(())
}
