use std::time::Duration;

use chrono::{DateTime, Local};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{prelude::*, quantity::UnitRate};

/// Octopus Energy tariff API client.
pub struct Api {
    client: Client,
    api_key: String,
    rates_url: Url,
}

impl Api {
    pub fn new(
        base_url: &Url,
        api_key: String,
        product_code: &str,
        tariff_code: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent("nightowl")
            .timeout(Duration::from_secs(10))
            .build()?;
        let rates_url = base_url
            .join(&format!(
                "v1/products/{product_code}/electricity-tariffs/{tariff_code}/standard-unit-rates/",
            ))
            .context("failed to build the unit rates URL")?;
        Ok(Self { client, api_key, rates_url })
    }

    /// Fetch the standard unit rates from the start of `period_from`'s hour onward.
    ///
    /// Returns the raw response body so that the caller can persist it
    /// verbatim; validating the body is the caller's job and happens before
    /// anything is written to disk.
    #[instrument(skip_all, fields(rates_url = %self.rates_url))]
    pub async fn get_unit_rates(&self, period_from: DateTime<Local>) -> Result<String, FetchError> {
        info!("fetching…");
        self.client
            .get(self.rates_url.clone())
            .basic_auth(&self.api_key, Some(""))
            .query(&[("period_from", period_from.format("%Y-%m-%dT%H:00:00").to_string())])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(FetchError::Network)?
            .text()
            .await
            .map_err(FetchError::Network)
    }
}

/// Failure modes the caller must tell apart: a network problem falls back
/// to the cached snapshot, while a malformed body must never overwrite it.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum FetchError {
    #[display("tariff API request failed: {_0}")]
    Network(reqwest::Error),

    #[display("malformed tariff payload: {_0}")]
    Malformed(serde_json::Error),
}

/// Raw tariff payload: the list of half-hourly unit rates.
#[derive(Debug, Deserialize)]
pub struct TariffData {
    pub results: Vec<UnitRateEntry>,
}

impl TariffData {
    /// Parse and validate a raw response body.
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(FetchError::Malformed)
    }
}

#[derive(Debug, Deserialize)]
pub struct UnitRateEntry {
    pub valid_from: DateTime<Local>,
    pub value_inc_vat: UnitRate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tariff_data_ok() -> Result {
        // language=json
        let body = r#"{
            "count": 2,
            "next": null,
            "previous": null,
            "results": [
                {
                    "value_exc_vat": 21.0,
                    "value_inc_vat": 22.05,
                    "valid_from": "2026-01-15T22:30:00Z",
                    "valid_to": "2026-01-15T23:00:00Z",
                    "payment_method": null
                },
                {
                    "value_exc_vat": 4.0,
                    "value_inc_vat": 4.2,
                    "valid_from": "2026-01-15T22:00:00Z",
                    "valid_to": "2026-01-15T22:30:00Z",
                    "payment_method": null
                }
            ]
        }"#;
        let data = TariffData::parse(body)?;
        assert_eq!(data.results.len(), 2);
        assert_eq!(data.results[1].value_inc_vat, UnitRate::from(4.2));
        Ok(())
    }

    #[test]
    fn malformed_body_is_rejected() {
        let error = TariffData::parse("pardon?").unwrap_err();
        assert!(matches!(error, FetchError::Malformed(_)));
    }
}
