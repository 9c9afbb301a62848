//! Cloudflare API Client
//!
//! Creates proxied CNAME records through the v4 REST API. A failed request
//! is reported as a [`CnameOutcome`], never as an error: DNS registration
//! must not stop the rest of the onboarding run.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare interprets a TTL of 1 as "automatic"
const AUTO_TTL: u32 = 1;

/// Cloudflare API client scoped to one zone
pub struct CloudflareClient {
    client: Client,
    api_token: String,
    zone_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

/// Result of a CNAME creation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CnameOutcome {
    /// 200 or 201
    Created,
    /// 409: a record with that name is already there
    AlreadyExists,
    /// Any other status, or no response at all
    Failed {
        status: Option<u16>,
        body: String,
    },
}

impl CnameOutcome {
    /// One-line summary for the operator
    pub fn describe(&self, name: &str, target: &str) -> String {
        match self {
            CnameOutcome::Created => {
                format!("Successfully added CNAME record: {} -> {}", name, target)
            }
            CnameOutcome::AlreadyExists => {
                format!("CNAME record already exists: {} -> {}", name, target)
            }
            CnameOutcome::Failed {
                status: Some(status),
                body,
            } => format!("Failed to add CNAME record: {} - {}", status, body),
            CnameOutcome::Failed { status: None, body } => {
                format!("Failed to add CNAME record: {}", body)
            }
        }
    }
}

impl CloudflareClient {
    /// Create a client for `zone_id` authenticating with `api_token`
    pub fn new(api_token: String, zone_id: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("service-onboard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_token,
            zone_id,
            base_url: CLOUDFLARE_API.to_string(),
        })
    }

    /// Point the client at another API root, e.g. a local mock server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Create a proxied CNAME `name -> target` with automatic TTL
    pub async fn create_cname(&self, name: &str, target: &str) -> CnameOutcome {
        let request = CreateRecordRequest {
            record_type: "CNAME",
            name,
            content: target,
            ttl: AUTO_TTL,
            proxied: true,
        };

        debug!(name, target, zone_id = %self.zone_id, "Creating CNAME record");

        let response = match self
            .client
            .post(self.records_url())
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Cloudflare request failed");
                return CnameOutcome::Failed {
                    status: None,
                    body: e.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("failed to read response body: {}", e),
        };

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                if let Ok(parsed) = serde_json::from_str::<ApiResponse<CreatedRecord>>(&body) {
                    if let Some(record) = parsed.result {
                        debug!(record_id = %record.id, "CNAME record created");
                    }
                }
                CnameOutcome::Created
            }
            StatusCode::CONFLICT => CnameOutcome::AlreadyExists,
            other => CnameOutcome::Failed {
                status: Some(other.as_u16()),
                body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_record_request_serialization() {
        let request = CreateRecordRequest {
            record_type: "CNAME",
            name: "grafana.example.com",
            content: "example.com",
            ttl: AUTO_TTL,
            proxied: true,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "CNAME",
                "name": "grafana.example.com",
                "content": "example.com",
                "ttl": 1,
                "proxied": true
            })
        );
    }

    #[test]
    fn test_api_response_without_result() {
        let parsed: ApiResponse<CreatedRecord> =
            serde_json::from_str(r#"{"success":true,"errors":[]}"#).unwrap();
        assert!(parsed.result.is_none());

        let parsed: ApiResponse<CreatedRecord> =
            serde_json::from_str(r#"{"result":{"id":"rec-1","name":"a"}}"#).unwrap();
        assert_eq!(parsed.result.unwrap().id, "rec-1");
    }

    #[test]
    fn test_outcome_messages() {
        let name = "grafana.example.com";
        let target = "example.com";

        assert_eq!(
            CnameOutcome::Created.describe(name, target),
            "Successfully added CNAME record: grafana.example.com -> example.com"
        );
        assert_eq!(
            CnameOutcome::AlreadyExists.describe(name, target),
            "CNAME record already exists: grafana.example.com -> example.com"
        );
        let failed = CnameOutcome::Failed {
            status: Some(403),
            body: "forbidden".to_string(),
        };
        assert_eq!(
            failed.describe(name, target),
            "Failed to add CNAME record: 403 - forbidden"
        );
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let client = CloudflareClient::new("token".to_string(), "zone123".to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:9999/");
        assert_eq!(
            client.records_url(),
            "http://127.0.0.1:9999/zones/zone123/dns_records"
        );
    }
}
