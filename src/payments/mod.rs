pub mod facilitator;
pub mod paywall;
pub mod pricing;
pub mod tracker;

pub use facilitator::{HttpFacilitator, SettleResponse};
pub use paywall::{Paywall, VerifiedPayment, PAYMENT_HEADER, PAYMENT_RESPONSE_HEADER};
pub use pricing::{format_amount, PriceEntry, PriceTable};
pub use tracker::{AnalyticsSummary, InMemoryTracker, NewTransaction, PaymentTracker};
