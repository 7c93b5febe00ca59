// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde_json::json;
use std::sync::Arc;

use super::facilitator::{Facilitator, PaymentRequirements, SettleResponse, X402_VERSION};
use crate::config::PaymentsConfig;
use crate::entrypoints::Entrypoint;
use crate::error::AppError;

pub const PAYMENT_HEADER: &str = "x-payment";
pub const PAYMENT_RESPONSE_HEADER: &str = "x-payment-response";

/// A payment the facilitator accepted, waiting to be settled
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub header: String,
    pub requirements: PaymentRequirements,
    pub payer: Option<String>,
}

/// Gatekeeper for paid entrypoints
pub struct Paywall {
    facilitator: Arc<dyn Facilitator>,
    pay_to: String,
    network: String,
    asset: String,
    max_timeout_seconds: u64,
    public_url: String,
}

impl Paywall {
    pub fn new(
        facilitator: Arc<dyn Facilitator>,
        config: &PaymentsConfig,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            facilitator,
            pay_to: config.pay_to.clone(),
            network: config.network.clone(),
            asset: config.asset.clone(),
            max_timeout_seconds: config.max_timeout_seconds,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn pay_to(&self) -> &str {
        &self.pay_to
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn requirements(&self, entrypoint: Entrypoint, price: u64) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: self.network.clone(),
            max_amount_required: price.to_string(),
            resource: format!("{}/entrypoints/{}/invoke", self.public_url, entrypoint.key()),
            description: entrypoint.description().to_string(),
            mime_type: "application/json".to_string(),
            pay_to: self.pay_to.clone(),
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset.clone(),
            extra: json!({ "name": "USDC", "version": "2" }),
        }
    }

    fn payment_required(requirements: &PaymentRequirements, error: &str) -> AppError {
        AppError::PaymentRequired(json!({
            "x402Version": X402_VERSION,
            "error": error,
            "accepts": [requirements],
        }))
    }

    /// Check the caller's payment header against the entrypoint's price.
    ///
    /// A missing or rejected payment yields a 402 carrying the requirements.
    pub async fn verify(
        &self,
        header: Option<&str>,
        entrypoint: Entrypoint,
        price: u64,
    ) -> Result<VerifiedPayment, AppError> {
        let requirements = self.requirements(entrypoint, price);

        let header = match header.map(str::trim).filter(|h| !h.is_empty()) {
            Some(header) => header,
            None => {
                return Err(Self::payment_required(
                    &requirements,
                    "X-PAYMENT header is required",
                ))
            }
        };

        let verdict = self
            .facilitator
            .verify(header, &requirements)
            .await
            .map_err(AppError::upstream)?;

        if !verdict.is_valid {
            let reason = verdict
                .invalid_reason
                .unwrap_or_else(|| "payment rejected".to_string());
            tracing::info!(%entrypoint, %reason, "payment rejected");
            return Err(Self::payment_required(&requirements, &reason));
        }

        Ok(VerifiedPayment {
            header: header.to_string(),
            requirements,
            payer: verdict.payer,
        })
    }

    pub async fn settle(&self, payment: &VerifiedPayment) -> Result<SettleResponse, AppError> {
        let settlement = self
            .facilitator
            .settle(&payment.header, &payment.requirements)
            .await
            .map_err(AppError::upstream)?;

        if !settlement.success {
            let reason = settlement
                .error_reason
                .clone()
                .unwrap_or_else(|| "settlement failed".to_string());
            tracing::warn!(%reason, "payment settlement failed");
            return Err(Self::payment_required(&payment.requirements, &reason));
        }

        Ok(settlement)
    }
}
