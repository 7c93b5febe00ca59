use std::sync::Arc;

use crate::api::{FrankfurterClient, RatesClientTrait};
use crate::config::Config;
use crate::payments::{HttpFacilitator, InMemoryTracker, PaymentTracker, Paywall, PriceTable};

/// Everything a request handler needs, built once at startup and shared via
/// `axum::extract::State`.
pub struct AppContext {
    pub config: Config,
    pub rates: Arc<dyn RatesClientTrait>,
    pub pricing: PriceTable,
    /// `None` when payments are disabled; every entrypoint is then free
    pub paywall: Option<Paywall>,
    /// `None` when analytics are disabled or unavailable
    pub tracker: Option<Arc<dyn PaymentTracker>>,
}

impl AppContext {
    pub fn new(
        config: Config,
        rates: Arc<dyn RatesClientTrait>,
        paywall: Option<Paywall>,
        tracker: Option<Arc<dyn PaymentTracker>>,
    ) -> Arc<Self> {
        let pricing = PriceTable::from_config(&config.pricing);
        Arc::new(Self {
            config,
            rates,
            pricing,
            paywall,
            tracker,
        })
    }

    /// Wire up the production collaborators described by `config`
    pub fn from_config(config: Config) -> Arc<Self> {
        let rates: Arc<dyn RatesClientTrait> =
            Arc::new(FrankfurterClient::new(config.upstream.base_url.clone()));

        let paywall = if config.payments.enabled {
            let facilitator = Arc::new(HttpFacilitator::new(
                config.payments.facilitator_url.clone(),
            ));
            Some(Paywall::new(facilitator, &config.payments, config.public_url()))
        } else {
            None
        };

        let tracker: Option<Arc<dyn PaymentTracker>> = if config.analytics.enabled {
            Some(Arc::new(InMemoryTracker::with_capacity(
                config.analytics.max_transactions,
            )))
        } else {
            None
        };

        Self::new(config, rates, paywall, tracker)
    }

    pub fn payments_enabled(&self) -> bool {
        self.paywall.is_some()
    }

    /// Price actually charged: zero for everything when payments are off
    pub fn effective_price(&self, entrypoint: crate::entrypoints::Entrypoint) -> u64 {
        if self.payments_enabled() {
            self.pricing.price(entrypoint)
        } else {
            0
        }
    }
}
