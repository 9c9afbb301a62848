//! Onboarding run
//!
//! The fixed sequence: back up and update the Traefik config, register the
//! CNAME, then back up and update the Authelia config. Each resource is
//! written independently; a later failure does not undo an earlier write.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::authelia::{self, RuleChange};
use crate::cloudflare::{CloudflareClient, CnameOutcome};
use crate::config::Settings;
use crate::document::{backup_timestamp, YamlDocument};
use crate::prompt::{Answers, Prompter};
use crate::traefik;
use crate::types::ServiceRequest;

/// Where the Authelia document and its backups live
#[derive(Debug, Clone)]
pub struct AutheliaPaths {
    pub config: PathBuf,
    pub backup_dir: PathBuf,
}

/// File locations for one run
#[derive(Debug, Clone)]
pub struct OnboardOptions {
    /// Traefik dynamic configuration to update in place
    pub routing_config: PathBuf,
    pub backup_dir: PathBuf,
    /// `None` skips the access-control step
    pub authelia: Option<AutheliaPaths>,
}

/// What a completed run did
#[derive(Debug)]
pub struct OnboardReport {
    pub request: ServiceRequest,
    pub subdomain: String,
    pub routing_backup: PathBuf,
    pub cname: CnameOutcome,
    pub authelia: Option<AutheliaUpdate>,
}

#[derive(Debug)]
pub struct AutheliaUpdate {
    pub backup: PathBuf,
    pub change: RuleChange,
}

/// Run every onboarding step once, in order
pub async fn run<R: BufRead, W: Write>(
    settings: &Settings,
    options: &OnboardOptions,
    prompter: &mut Prompter<R, W>,
    answers: Answers,
    cloudflare: &CloudflareClient,
) -> Result<OnboardReport> {
    let timestamp = backup_timestamp();

    let mut routing = YamlDocument::load(&options.routing_config)
        .context("Failed to load routing config")?;
    let routing_backup = routing
        .backup(&options.backup_dir, &format!("config_backup_{}.yml", timestamp))
        .context("Failed to back up routing config")?;
    println!(
        "Backup of the original config file saved as {}",
        routing_backup.display()
    );

    let request = prompter.collect(answers)?;
    let subdomain = settings.subdomain(&request.name);
    info!(
        service = %request.name,
        address = %request.address,
        scheme = %request.scheme,
        "Adding Traefik router and service"
    );

    traefik::add_service(&mut routing, &request, &settings.domain)?;
    routing.save().context("Failed to write routing config")?;
    println!(
        "Updated config file saved as {}",
        options.routing_config.display()
    );

    let cname = cloudflare.create_cname(&subdomain, &settings.domain).await;
    let summary = cname.describe(&subdomain, &settings.domain);
    debug!(outcome = ?cname, "Cloudflare request finished");
    println!("{}", summary);

    let authelia = match &options.authelia {
        Some(paths) => Some(update_authelia(paths, &subdomain, &timestamp)?),
        None => {
            info!("Skipping Authelia update");
            None
        }
    };

    Ok(OnboardReport {
        request,
        subdomain,
        routing_backup,
        cname,
        authelia,
    })
}

fn update_authelia(
    paths: &AutheliaPaths,
    subdomain: &str,
    timestamp: &str,
) -> Result<AutheliaUpdate> {
    let mut doc =
        YamlDocument::load(&paths.config).context("Failed to load Authelia configuration")?;
    let backup = doc
        .backup(
            &paths.backup_dir,
            &format!("configuration_backup_{}.yml", timestamp),
        )
        .context("Failed to back up Authelia configuration")?;
    println!(
        "Backup of the original Authelia config file saved as {}",
        backup.display()
    );

    let change = authelia::add_subdomain(&mut doc, subdomain)?;
    doc.save().context("Failed to write Authelia configuration")?;
    println!(
        "Authelia configuration updated with new subdomain {}",
        subdomain
    );

    Ok(AutheliaUpdate { backup, change })
}
