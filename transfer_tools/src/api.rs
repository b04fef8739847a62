use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::TransferApiConfig,
    data_objects::{ApiErrorBody, NewTransfer, Transfer},
    TransferApiError,
};

#[derive(Clone)]
pub struct TransferApi {
    config: TransferApiConfig,
    client: Arc<Client>,
}

impl TransferApi {
    pub fn new(config: TransferApiConfig) -> Result<Self, TransferApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.api_key.reveal());
        let mut val =
            HeaderValue::from_str(&bearer).map_err(|e| TransferApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransferApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Instructs the provider to move funds to the recipient's payout destination.
    pub async fn create_transfer(&self, transfer: NewTransfer) -> Result<Transfer, TransferApiError> {
        debug!("Creating transfer of {} to {} ({})", transfer.amount, transfer.recipient, transfer.reference);
        let result: Transfer = self.rest_query(Method::POST, "/transfers", Some(transfer)).await?;
        info!("Transfer [{}] created with status {}", result.id, result.status);
        Ok(result)
    }

    pub async fn fetch_transfer(&self, transfer_id: &str) -> Result<Transfer, TransferApiError> {
        let path = format!("/transfers/{transfer_id}");
        self.rest_query::<Transfer, ()>(Method::GET, &path, None).await
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, TransferApiError> {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| TransferApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| TransferApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let fallback = format!("HTTP {status}");
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.describe(&fallback),
                Err(_) => fallback,
            };
            Err(TransferApiError::TransferRejected { status, message })
        }
    }
}
