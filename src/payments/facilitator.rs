// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

pub const X402_VERSION: u32 = 1;

/// What the caller must pay for one invocation (x402 "exact" scheme)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: String,
    pub resource: String,
    pub description: String,
    pub mime_type: String,
    pub pay_to: String,
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(default)]
    pub extra: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

/// Verifies and settles payments on behalf of the service
#[async_trait::async_trait]
pub trait Facilitator: Send + Sync {
    async fn verify(
        &self,
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse>;

    async fn settle(
        &self,
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse>;
}

/// Facilitator reached over HTTP (`POST {url}/verify`, `POST {url}/settle`)
#[derive(Clone)]
pub struct HttpFacilitator {
    client: Client,
    url: String,
}

impl HttpFacilitator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> Result<T> {
        let url = format!("{}/{}", self.url, path);
        let body = json!({
            "x402Version": X402_VERSION,
            "paymentHeader": payment_header,
            "paymentRequirements": requirements,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach facilitator at {}", url))?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!("Facilitator {} failed: {} - {}", path, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse facilitator {} response", path))
    }
}

#[async_trait::async_trait]
impl Facilitator for HttpFacilitator {
    async fn verify(
        &self,
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        self.post("verify", payment_header, requirements).await
    }

    async fn settle(
        &self,
        payment_header: &str,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        self.post("settle", payment_header, requirements).await
    }
}
