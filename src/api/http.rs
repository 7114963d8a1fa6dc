// Copyright (c) 2025 - Cowboy AI, Inc.

//! Hetzner Cloud HTTP Binding
//!
//! Implements [`NetworkApi`] against the Hetzner Cloud v1 REST API.
//!
//! ```text
//! get_network    = GET  /networks/{id}
//! add_subnet     = POST /networks/{id}/actions/add_subnet
//! delete_subnet  = POST /networks/{id}/actions/delete_subnet
//! get_action     = GET  /actions/{id}
//! ```
//!
//! Error bodies have the shape `{"error": {"code": "...", "message": "..."}}`.
//! The `code` becomes an [`ApiErrorCode`]; the message is kept for
//! diagnostics only.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cim_network_subnet::api::HcloudClient;
//! use cim_network_subnet::config::ReconcilerConfig;
//! use cim_network_subnet::SubnetReconciler;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReconcilerConfig::from_env()?;
//! let client = HcloudClient::new(&config)?;
//! let reconciler = SubnetReconciler::from_config(Arc::new(client), &config);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Action, NetworkApi};
use crate::config::ReconcilerConfig;
use crate::domain::{IpRange, Network, SubnetSpec};
use crate::errors::{ApiError, ApiErrorCode, ApiResult};

#[derive(Debug, Deserialize)]
struct NetworkEnvelope {
    network: Network,
}

#[derive(Debug, Deserialize)]
struct ActionEnvelope {
    action: Action,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct AddSubnetRequest<'a> {
    #[serde(rename = "type")]
    subnet_type: &'a str,
    ip_range: String,
    network_zone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vswitch_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct DeleteSubnetRequest {
    ip_range: String,
}

/// Hetzner Cloud API client
pub struct HcloudClient {
    endpoint: String,
    client: Client,
}

impl HcloudClient {
    /// Create a client from configuration
    pub fn new(config: &ReconcilerConfig) -> ApiResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", config.token).parse().map_err(|e| {
                ApiError::new(ApiErrorCode::Unauthorized, format!("Invalid API token: {}", e))
            })?,
        );

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ApiError::new(
                    ApiErrorCode::Transport,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("GET {} returned 404", path);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<T>().await.map(Some).map_err(decode_error)
    }

    async fn post_action<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Action> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let envelope: ActionEnvelope = response.json().await.map_err(decode_error)?;
        debug!(
            "POST {} started action {} ({})",
            path, envelope.action.id, envelope.action.command
        );
        Ok(envelope.action)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::new(ApiErrorCode::Transport, format!("Hetzner Cloud API error: {}", err))
}

fn decode_error(err: reqwest::Error) -> ApiError {
    ApiError::new(
        ApiErrorCode::InvalidResponse,
        format!("Invalid Hetzner Cloud API response: {}", err),
    )
}

fn code_from_status(status: StatusCode) -> ApiErrorCode {
    match status {
        StatusCode::NOT_FOUND => ApiErrorCode::NotFound,
        StatusCode::CONFLICT => ApiErrorCode::Conflict,
        StatusCode::LOCKED => ApiErrorCode::Locked,
        StatusCode::UNAUTHORIZED => ApiErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ApiErrorCode::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => ApiErrorCode::RateLimitExceeded,
        _ => ApiErrorCode::InvalidResponse,
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => ApiError::new(
            ApiErrorCode::from_code(&envelope.error.code),
            envelope.error.message,
        ),
        Err(_) => ApiError::new(
            code_from_status(status),
            format!("Hetzner Cloud API returned {}: {}", status, body),
        ),
    }
}

#[async_trait]
impl NetworkApi for HcloudClient {
    async fn get_network(&self, id: u64) -> ApiResult<Option<Network>> {
        let envelope: Option<NetworkEnvelope> = self.get(&format!("/networks/{}", id)).await?;
        Ok(envelope.map(|e| e.network))
    }

    async fn add_subnet(&self, spec: &SubnetSpec) -> ApiResult<Action> {
        let request = AddSubnetRequest {
            subnet_type: spec.kind.subnet_type().as_str(),
            ip_range: spec.ip_range.canonical(),
            network_zone: spec.network_zone.as_str(),
            vswitch_id: spec.kind.vswitch_id(),
        };
        self.post_action(
            &format!("/networks/{}/actions/add_subnet", spec.network_id),
            &request,
        )
        .await
    }

    /// Every `service_error` from this endpoint is reported as
    /// [`ApiErrorCode::SubnetsAttached`], so a genuine remote failure is also
    /// retried until the attempt bound is exhausted.
    async fn delete_subnet(&self, network_id: u64, ip_range: &IpRange) -> ApiResult<Action> {
        let request = DeleteSubnetRequest {
            ip_range: ip_range.canonical(),
        };
        self.post_action(
            &format!("/networks/{}/actions/delete_subnet", network_id),
            &request,
        )
        .await
        .map_err(|mut err| {
            // The endpoint reports servers still being detached as service_error.
            if err.code == ApiErrorCode::ServiceError {
                err.code = ApiErrorCode::SubnetsAttached;
            }
            err
        })
    }

    async fn get_action(&self, id: u64) -> ApiResult<Option<Action>> {
        let envelope: Option<ActionEnvelope> = self.get(&format!("/actions/{}", id)).await?;
        Ok(envelope.map(|e| e.action))
    }
}
