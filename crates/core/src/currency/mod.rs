//! Currency conversion, rounding and allocation.

pub mod allocation;
pub mod converter;
pub mod service;

#[cfg(test)]
mod props;

pub use allocation::AllocationUtil;
pub use converter::CurrencyConverter;
pub use service::CurrencyService;
