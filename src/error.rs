//! Error types for the onboarding run
//!
//! Fatal conditions get their own variant so `main` can print a precise
//! diagnostic. Cloudflare failures are not here: they are reported through
//! [`crate::cloudflare::CnameOutcome`] and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop an onboarding run
#[derive(Debug, Error)]
pub enum OnboardError {
    /// One or more required settings were absent or empty
    #[error("Please ensure {} are set in the .env file.", .0.join(", "))]
    MissingSettings(Vec<&'static str>),

    /// Scheme answer was neither http nor https
    #[error("Invalid scheme. Please enter 'http' or 'https'.")]
    InvalidScheme(String),

    /// A document section exists but has the wrong YAML kind
    #[error("{path}: `{section}` must be a {expected}")]
    DocumentShape {
        path: PathBuf,
        section: String,
        expected: &'static str,
    },

    /// Reading or writing a document or backup failed
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be parsed or serialized as YAML
    #[error("{path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Standard input closed before a prompt was answered
    #[error("no answer given for: {0}")]
    NoInput(String),
}

/// Result alias for onboarding operations
pub type OnboardResult<T> = Result<T, OnboardError>;
