use std::future::Future;

use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::{AppError, Context};
use crate::utils::truncate_for_log;

use super::payload::{decode_payload, HisStockPayload};
use super::request::{prepare_request, PreparedRequest};
use super::{FetchResult, PayloadSource};

const ERROR_BODY_PREVIEW: usize = 200;

/// Issues `hisstock_list` requests. One GET per call, never retried.
pub struct HisStockClient {
    client: Client,
    request: PreparedRequest,
}

impl HisStockClient {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            request: prepare_request(config)?,
        })
    }

    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub async fn fetch_payload(&self) -> FetchResult<HisStockPayload> {
        let url = self.request.full_url();
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.request.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::HttpStatus {
                status,
                body: truncate_for_log(&body, ERROR_BODY_PREVIEW),
            });
        }

        let body = response.text().await?;
        decode_payload(&body)
    }
}

impl PayloadSource for HisStockClient {
    fn fetch(&self) -> impl Future<Output = FetchResult<HisStockPayload>> + Send {
        self.fetch_payload()
    }

    fn reconfigure(&mut self, config: &FetchConfig) -> FetchResult<()> {
        *self = HisStockClient::new(config)?;
        Ok(())
    }
}

fn build_client(config: &FetchConfig) -> FetchResult<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .build()
        .context("Failed to construct HTTP client")?)
}
