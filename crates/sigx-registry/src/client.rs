//! HTTP client for the exchange's public instrument catalog.

use crate::error::{RegistryError, RegistryResult};
use crate::rest::ApiResponse;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sigx_core::{InstrumentMeta, Price, Size};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for catalog requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Public instrument catalog path.
pub const INSTRUMENTS_PATH: &str = "/api/v1/market/instruments";

/// Raw instrument entry from the catalog.
///
/// Only the fields needed for sizing are required; everything else the
/// exchange sends is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstrument {
    pub inst_id: String,
    pub tick_size: Decimal,
    pub lot_size: Decimal,
    pub contract_value: Decimal,
}

impl RawInstrument {
    fn into_meta(self) -> RegistryResult<InstrumentMeta> {
        InstrumentMeta::new(
            self.inst_id,
            Price::new(self.tick_size),
            Size::new(self.lot_size),
            self.contract_value,
        )
        .map_err(|e| RegistryError::MalformedResponse(e.to_string()))
    }
}

/// Resolves instrument metadata. Read-only; no side effects.
#[derive(Debug, Clone)]
pub struct InstrumentClient {
    client: Client,
    base_url: String,
}

impl InstrumentClient {
    /// Create a new client against a REST base URL (e.g. "https://openapi.blofin.com").
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing HTTP client (shares its connection pool).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch tick size, lot size and contract value for one instrument.
    ///
    /// # Errors
    /// - `NotFound` when the catalog has no entry for `inst_id`
    /// - `HttpClient` on network failure or non-2xx status
    /// - `MalformedResponse` when the body does not have the expected shape
    pub async fn resolve(&self, inst_id: &str) -> RegistryResult<InstrumentMeta> {
        let url = format!("{}{}", self.base_url, INSTRUMENTS_PATH);
        debug!(url = %url, inst_id, "Fetching instrument metadata");

        let response = self
            .client
            .get(&url)
            .query(&[("instId", inst_id)])
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("Failed to read response: {e}")))?;

        let meta = parse_instruments(&body, inst_id)?;
        info!(
            inst_id = %meta.inst_id,
            tick_size = %meta.tick_size,
            lot_size = %meta.lot_size,
            contract_value = %meta.contract_value,
            "Resolved instrument metadata"
        );
        Ok(meta)
    }
}

/// Parse a catalog response body and pick the entry for `inst_id`.
fn parse_instruments(body: &str, inst_id: &str) -> RegistryResult<InstrumentMeta> {
    let envelope: ApiResponse<Vec<RawInstrument>> = serde_json::from_str(body)
        .map_err(|e| RegistryError::MalformedResponse(format!("instruments: {e}")))?;

    if !envelope.is_success() {
        return Err(RegistryError::Rejected {
            code: envelope.code,
            message: envelope.msg,
        });
    }

    let entries = envelope.data.unwrap_or_default();
    if entries.len() > 1 {
        warn!(
            inst_id,
            count = entries.len(),
            "Catalog returned several instruments, filtering by instId"
        );
    }

    entries
        .into_iter()
        .find(|raw| raw.inst_id.eq_ignore_ascii_case(inst_id))
        .ok_or_else(|| RegistryError::NotFound(inst_id.to_string()))?
        .into_meta()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_instrument() {
        let body = r#"{
            "code": "0",
            "msg": "success",
            "data": [{
                "instId": "SOL-USDT",
                "baseCurrency": "SOL",
                "quoteCurrency": "USDT",
                "contractValue": "1",
                "listTime": "1695888000000",
                "maxLeverage": "50",
                "minSize": "1",
                "lotSize": "0.1",
                "tickSize": "0.01",
                "instType": "SWAP",
                "contractType": "linear",
                "state": "live"
            }]
        }"#;

        let meta = parse_instruments(body, "SOL-USDT").unwrap();
        assert_eq!(meta.tick_size, Price::new(dec!(0.01)));
        assert_eq!(meta.lot_size, Size::new(dec!(0.1)));
        assert_eq!(meta.contract_value, dec!(1));
    }

    #[test]
    fn test_parse_empty_data_is_not_found() {
        let body = r#"{"code":"0","msg":"","data":[]}"#;
        let err = parse_instruments(body, "NOPE-USDT").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref id) if id == "NOPE-USDT"));
    }

    #[test]
    fn test_parse_filters_other_instruments() {
        let body = r#"{"code":"0","msg":"","data":[
            {"instId":"BTC-USDT","tickSize":"0.1","lotSize":"1","contractValue":"0.001"},
            {"instId":"ETH-USDT","tickSize":"0.01","lotSize":"1","contractValue":"0.01"}
        ]}"#;
        let meta = parse_instruments(body, "ETH-USDT").unwrap();
        assert_eq!(meta.contract_value, dec!(0.01));

        let err = parse_instruments(body, "SOL-USDT").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn test_parse_missing_field_is_malformed() {
        let body = r#"{"code":"0","msg":"","data":[{"instId":"SOL-USDT","tickSize":"0.01"}]}"#;
        let err = parse_instruments(body, "SOL-USDT").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_zero_tick_is_malformed() {
        let body = r#"{"code":"0","msg":"","data":[
            {"instId":"SOL-USDT","tickSize":"0","lotSize":"0.1","contractValue":"1"}
        ]}"#;
        let err = parse_instruments(body, "SOL-USDT").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_error_code() {
        let body = r#"{"code":"152001","msg":"Parameter instId error"}"#;
        let err = parse_instruments(body, "SOL-USDT").unwrap_err();
        assert!(matches!(err, RegistryError::Rejected { ref code, .. } if code == "152001"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = InstrumentClient::new("http://localhost:9/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9");
    }
}
