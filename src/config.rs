//! Runtime settings
//!
//! The three Cloudflare/domain values come from the environment (a local
//! `.env` file is loaded first by `main`) or from the matching CLI flags.
//! All three are required; nothing runs until they are present.

use crate::error::{OnboardError, OnboardResult};

pub const API_TOKEN_VAR: &str = "CLOUDFLARE_API_TOKEN";
pub const ZONE_ID_VAR: &str = "CLOUDFLARE_ZONE_ID";
pub const DOMAIN_VAR: &str = "DOMAIN_NAME";

/// Validated Cloudflare and domain settings
#[derive(Clone)]
pub struct Settings {
    pub api_token: String,
    pub zone_id: String,
    pub domain: String,
}

impl Settings {
    /// Build settings from optional raw values.
    ///
    /// Empty strings count as missing. The error lists every missing
    /// variable, not just the first.
    pub fn from_values(
        api_token: Option<String>,
        zone_id: Option<String>,
        domain: Option<String>,
    ) -> OnboardResult<Self> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        let missing: Vec<&'static str> = [
            (API_TOKEN_VAR, present(&api_token)),
            (ZONE_ID_VAR, present(&zone_id)),
            (DOMAIN_VAR, present(&domain)),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect();

        match (api_token, zone_id, domain) {
            (Some(api_token), Some(zone_id), Some(domain)) if missing.is_empty() => Ok(Self {
                api_token,
                zone_id,
                domain,
            }),
            _ => Err(OnboardError::MissingSettings(missing)),
        }
    }

    /// Fully qualified hostname for a service, e.g. `grafana.example.com`
    pub fn subdomain(&self, service: &str) -> String {
        format!("{}.{}", service, self.domain)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_token", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .field("domain", &self.domain)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_all_values_present() {
        let settings =
            Settings::from_values(some("token"), some("zone"), some("example.com")).unwrap();
        assert_eq!(settings.zone_id, "zone");
        assert_eq!(settings.subdomain("grafana"), "grafana.example.com");
    }

    #[test]
    fn test_missing_and_empty_values_are_reported() {
        let err = Settings::from_values(None, some(""), some("example.com")).unwrap_err();
        match err {
            OnboardError::MissingSettings(names) => {
                assert_eq!(names, vec![API_TOKEN_VAR, ZONE_ID_VAR]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings =
            Settings::from_values(some("s3cret"), some("zone"), some("example.com")).unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
