use std::future::Future;

use crate::config::FetchConfig;
use crate::error::Result;

pub mod client;
pub mod decode;
pub mod payload;
pub mod request;

pub use client::HisStockClient;
pub use payload::{
    decode_payload, CreditObservation, CreditSeries, HisStockPayload, StockObservation,
    StockSeries,
};
pub use request::{prepare_request, PreparedRequest};

pub type FetchResult<T> = Result<T>;

/// Anything that can produce one `hisstock_list` payload per refresh cycle.
pub trait PayloadSource {
    fn fetch(&self) -> impl Future<Output = FetchResult<HisStockPayload>> + Send;

    /// Apply new fetch settings between cycles.
    fn reconfigure(&mut self, _config: &FetchConfig) -> FetchResult<()> {
        Ok(())
    }
}
