//! Onboarding request types

use std::str::FromStr;

use crate::error::OnboardError;

/// Scheme Traefik uses to reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Scheme {
    type Err = OnboardError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(OnboardError::InvalidScheme(s.to_string())),
        }
    }
}

/// The service being exposed, as answered at the prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Used verbatim in router/service names and the subdomain
    pub name: String,
    /// IP address or host of the backend, unchecked
    pub address: String,
    pub scheme: Scheme,
}

impl ServiceRequest {
    /// Name of the Traefik service the router points at
    pub fn service_id(&self) -> String {
        format!("{}-svc", self.name)
    }

    /// Backend URL for the load balancer, always with a trailing slash
    pub fn backend_url(&self) -> String {
        format!("{}://{}/", self.scheme, self.address)
    }
}
