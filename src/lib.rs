//! Homelab service onboarding
//!
//! Exposes a service in one pass: a Traefik router/service pair, a proxied
//! Cloudflare CNAME, and an Authelia `one_factor` access rule.

pub mod authelia;
pub mod cloudflare;
pub mod config;
pub mod document;
pub mod error;
pub mod onboard;
pub mod prompt;
pub mod traefik;
pub mod types;

pub use cloudflare::{CloudflareClient, CnameOutcome};
pub use config::Settings;
pub use error::{OnboardError, OnboardResult};
pub use onboard::{run, AutheliaPaths, OnboardOptions, OnboardReport};
