// Re-export model modules
pub mod currencies;
pub mod exchange_rates;
pub mod statistics;

pub use currencies::*;
pub use exchange_rates::*;
pub use statistics::*;
