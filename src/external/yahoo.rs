use crate::external::price_provider::{ExternalPricePoint, PriceProvider, PriceProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart API. No API key required.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; index-tracker/0.1)")
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn range_for_days(days: u32) -> &'static str {
    if days <= 1 {
        "1d"
    } else if days <= 5 {
        "5d"
    } else if days <= 30 {
        "1mo"
    } else if days <= 90 {
        "3mo"
    } else if days <= 180 {
        "6mo"
    } else {
        "1y"
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ExternalPricePoint>, PriceProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        debug!("Requesting {} daily closes from {}", ticker, url);

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", range_for_days(days))])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if let Some(error) = body.chart.error {
            if error.description.contains("No data found") {
                return Err(PriceProviderError::NotFound);
            }
            return Err(PriceProviderError::BadResponse(error.description));
        }

        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or(PriceProviderError::NotFound)?;

        let closes = result
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .ok_or_else(|| PriceProviderError::BadResponse("missing quote".into()))?;

        if result.timestamp.len() != closes.len() {
            return Err(PriceProviderError::Parse(
                "timestamp and close arrays have different lengths".into(),
            ));
        }

        let mut points: Vec<ExternalPricePoint> = result
            .timestamp
            .iter()
            .zip(closes.iter())
            .filter_map(|(ts, close)| {
                // skip missing closes (holidays, halted sessions)
                let close = (*close)?;
                let date = chrono::DateTime::from_timestamp(*ts, 0)?.date_naive();
                Some(ExternalPricePoint { date, close })
            })
            .collect();

        points.sort_by_key(|p| p.date);

        if points.is_empty() {
            return Err(PriceProviderError::NotFound);
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(symbol: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_fetch_daily_history_skips_null_closes() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1760448600, 1760362200, 1760535000],
                    "indicators": { "quote": [{ "close": [6644.31, 6654.72, null] }] }
                }],
                "error": null
            }
        }"#;
        let server = create_mock_server("SPX", 200, body).await;
        let provider = YahooProvider::new(&server.uri());

        let points = provider.fetch_daily_history("SPX", 5).await.unwrap();

        assert_eq!(points.len(), 2);
        // sorted oldest first
        assert_eq!(points[0].close, 6654.72);
        assert_eq!(points[1].close, 6644.31);
    }

    #[tokio::test]
    async fn test_requests_range_matching_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/SPX"))
            .and(query_param("range", "1d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"chart":{"result":[{"timestamp":[1760448600],"indicators":{"quote":[{"close":[6644.31]}]}}],"error":null}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = YahooProvider::new(&server.uri());
        let points = provider.fetch_daily_history("SPX", 1).await.unwrap();
        assert_eq!(points.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        let server = create_mock_server("SPX", 200, body).await;
        let provider = YahooProvider::new(&server.uri());

        let err = provider.fetch_daily_history("SPX", 1).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_all_null_closes_is_not_found() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1760448600],
                    "indicators": { "quote": [{ "close": [null] }] }
                }],
                "error": null
            }
        }"#;
        let server = create_mock_server("SPX", 200, body).await;
        let provider = YahooProvider::new(&server.uri());

        let err = provider.fetch_daily_history("SPX", 1).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_chart_error_is_bad_response() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        let server = create_mock_server("SPX", 200, body).await;
        let provider = YahooProvider::new(&server.uri());

        let err = provider.fetch_daily_history("SPX", 1).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::BadResponse(msg) if msg == "Invalid input"));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let server = create_mock_server("SPX", 429, "Too Many Requests").await;
        let provider = YahooProvider::new(&server.uri());

        let err = provider.fetch_daily_history("SPX", 1).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = create_mock_server("SPX", 200, "not json").await;
        let provider = YahooProvider::new(&server.uri());

        let err = provider.fetch_daily_history("SPX", 1).await.unwrap_err();
        assert!(matches!(err, PriceProviderError::Parse(_)));
    }

    #[test]
    fn test_range_for_days() {
        assert_eq!(range_for_days(1), "1d");
        assert_eq!(range_for_days(5), "5d");
        assert_eq!(range_for_days(60), "3mo");
        assert_eq!(range_for_days(400), "1y");
    }
}
