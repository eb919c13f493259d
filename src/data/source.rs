//! Rate providers.
//!
//! The HTTP source reads the free fawazahmed0 currency API served from
//! jsDelivr. Each response looks like
//! `{"date": "2024-03-06", "usd": {"cny": 7.19, "sgd": 1.34, ...}}`.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use log::debug;

use super::models::{Snapshot, BASE_CURRENCY};

const API_BASE_URL: &str = "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can produce daily rate snapshots
pub trait RateSource {
    /// The provider's most recent rates
    fn fetch_latest(&self) -> Result<Snapshot>;

    /// Rates published for a specific calendar day
    fn fetch_on(&self, date: NaiveDate) -> Result<Snapshot>;
}

/// Blocking HTTP client for the currency API
pub struct HttpRateSource {
    client: reqwest::blocking::Client,
    base_url: String,
    currencies: Vec<String>,
}

impl HttpRateSource {
    pub fn new(currencies: Vec<String>) -> Result<Self> {
        Self::with_base_url(API_BASE_URL, currencies)
    }

    pub fn with_base_url(base_url: &str, currencies: Vec<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpRateSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            currencies,
        })
    }

    fn url_for(&self, tag: &str) -> String {
        format!(
            "{}@{}/v1/currencies/{}.json",
            self.base_url,
            tag,
            BASE_CURRENCY.to_lowercase()
        )
    }

    fn get(&self, url: &str) -> Result<serde_json::Value> {
        debug!("GET {url}");
        self.client
            .get(url)
            .send()
            .with_context(|| format!("Request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("Provider returned an error: {url}"))?
            .json()
            .with_context(|| format!("Invalid JSON from {url}"))
    }
}

impl RateSource for HttpRateSource {
    fn fetch_latest(&self) -> Result<Snapshot> {
        let body = self.get(&self.url_for("latest"))?;
        let date = response_date(&body)?.unwrap_or_else(|| Utc::now().date_naive());
        parse_provider_body(&body, date, &self.currencies)
    }

    /// The snapshot is always filed under `date`, whatever the response says.
    fn fetch_on(&self, date: NaiveDate) -> Result<Snapshot> {
        let body = self.get(&self.url_for(&date.format("%Y-%m-%d").to_string()))?;
        parse_provider_body(&body, date, &self.currencies)
    }
}

/// The `date` field of a provider response, if it has one
fn response_date(body: &serde_json::Value) -> Result<Option<NaiveDate>> {
    body.get("date")
        .and_then(|d| d.as_str())
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Invalid date in response: {raw}"))
        })
        .transpose()
}

/// Turn a provider response's rate table into a snapshot for `date`
fn parse_provider_body(
    body: &serde_json::Value,
    date: NaiveDate,
    currencies: &[String],
) -> Result<Snapshot> {
    let base_key = BASE_CURRENCY.to_lowercase();
    let quotes = body
        .get(&base_key)
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow!("Response has no '{base_key}' rate table"))?;

    let quotes = quotes
        .iter()
        .filter_map(|(code, value)| value.as_f64().map(|v| (code.clone(), v)));

    Ok(Snapshot::from_quotes(date, BASE_CURRENCY, quotes, currencies)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> Vec<String> {
        ["CNY", "SGD", "JPY", "AUD"].iter().map(|s| s.to_string()).collect()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_provider_body() {
        let body = serde_json::json!({
            "date": "2024-03-06",
            "usd": {"cny": 7.1932, "sgd": 1.3421, "jpy": 149.81, "aud": 1.5312, "eur": 0.92}
        });
        let snap = parse_provider_body(&body, day("2024-03-06"), &tracked()).unwrap();

        assert_eq!(snap.date, day("2024-03-06"));
        assert_eq!(snap.base, "USD");
        assert_eq!(snap.rates.len(), 4);
        assert_eq!(snap.rate("JPY"), Some(149.81));
    }

    #[test]
    fn test_parse_provider_body_keeps_requested_date() {
        // Weekend requests come back stamped with the previous trading day
        let body = serde_json::json!({"date": "2024-03-01", "usd": {"cny": 7.19}});
        let snap = parse_provider_body(&body, day("2024-03-03"), &tracked()).unwrap();
        assert_eq!(snap.date, day("2024-03-03"));
    }

    #[test]
    fn test_response_date() {
        let dated = serde_json::json!({"date": "2024-03-06", "usd": {}});
        assert_eq!(response_date(&dated).unwrap(), Some(day("2024-03-06")));

        let undated = serde_json::json!({"usd": {"cny": 7.19}});
        assert_eq!(response_date(&undated).unwrap(), None);

        let bad_date = serde_json::json!({"date": "06/03/2024", "usd": {"cny": 7.19}});
        assert!(response_date(&bad_date).is_err());
    }

    #[test]
    fn test_parse_provider_body_errors() {
        let missing_table = serde_json::json!({"date": "2024-03-06", "eur": {}});
        assert!(parse_provider_body(&missing_table, day("2024-03-06"), &tracked()).is_err());

        let negative = serde_json::json!({"usd": {"cny": -7.19}});
        assert!(parse_provider_body(&negative, day("2024-03-06"), &tracked()).is_err());
    }

    #[test]
    fn test_url_for() {
        let source =
            HttpRateSource::with_base_url("https://example.test/api/", tracked()).unwrap();
        assert_eq!(
            source.url_for("2024-03-06"),
            "https://example.test/api@2024-03-06/v1/currencies/usd.json"
        );
    }
}
