//! Traefik dynamic configuration entries
//!
//! Builds the router and load-balancer service for a [`ServiceRequest`] and
//! merges them into `http.routers` / `http.services`. Existing entries with
//! the same name are replaced; both sections end up sorted by key.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::document::{sort_mapping, YamlDocument};
use crate::error::{OnboardError, OnboardResult};
use crate::types::ServiceRequest;

const ENTRY_POINT: &str = "https";
const MIDDLEWARE: &str = "chain-no-auth";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub entry_points: Vec<String>,
    pub rule: String,
    pub middlewares: Vec<String>,
    pub tls: Mapping,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub load_balancer: LoadBalancer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub servers: Vec<Server>,
    pub pass_host_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    pub url: String,
}

impl Router {
    /// HTTPS router matching `<service>.<domain>`
    pub fn for_request(request: &ServiceRequest, domain: &str) -> Self {
        Self {
            entry_points: vec![ENTRY_POINT.to_string()],
            rule: format!("Host(`{}.{}`)", request.name, domain),
            middlewares: vec![MIDDLEWARE.to_string()],
            tls: Mapping::new(),
            service: request.service_id(),
        }
    }
}

impl ServiceDefinition {
    /// Single-backend load balancer passing the Host header through
    pub fn for_request(request: &ServiceRequest) -> Self {
        Self {
            load_balancer: LoadBalancer {
                servers: vec![Server {
                    url: request.backend_url(),
                }],
                pass_host_header: true,
            },
        }
    }
}

/// Merge router and service for `request` into the routing document
pub fn add_service(
    doc: &mut YamlDocument,
    request: &ServiceRequest,
    domain: &str,
) -> OnboardResult<()> {
    let router = to_value(doc, &Router::for_request(request, domain))?;
    let service = to_value(doc, &ServiceDefinition::for_request(request))?;

    insert_sorted(doc.mapping_mut(&["http", "routers"])?, &request.name, router);
    insert_sorted(
        doc.mapping_mut(&["http", "services"])?,
        &request.service_id(),
        service,
    );
    Ok(())
}

fn insert_sorted(section: &mut Mapping, name: &str, entry: Value) {
    section.insert(Value::String(name.to_string()), entry);
    sort_mapping(section);
}

fn to_value<T: Serialize>(doc: &YamlDocument, entry: &T) -> OnboardResult<Value> {
    serde_yaml::to_value(entry).map_err(|source| OnboardError::Yaml {
        path: doc.path().to_path_buf(),
        source,
    })
}
