//! Best-effort HTTP requests whose results are handed to a continuation.
//!
//! Delivery is at most once: failures are logged and swallowed here, the
//! continuation only runs for a usable reply, and nothing is retried.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// `response` value meaning "acknowledged, nothing to report"
const NO_VALUE_SENTINEL: i64 = -1;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid request target {0}: {1}")]
    InvalidTarget(String, String),
}

/// How the body of a response is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// JSON object carrying the result in its `response` field
    Envelope,
    /// Body is ignored, completion is the only signal
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(JsonValue),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub timeout_secs: u64,

    /// Prefix for relative request targets
    pub base_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl Gateway {
    /// # Errors
    /// If the HTTP client cannot be built or `base_url` is not a valid URL.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|base| {
                Url::parse(base).map_err(|err| {
                    GatewayError::InvalidTarget(base.to_string(), err.to_string())
                })
            })
            .transpose()?;

        Ok(Self { client, base_url })
    }

    /// Issue a GET to `target` and hand the decoded reply to `continuation`.
    ///
    /// Returns `true` when the continuation ran. Transport and parse errors
    /// are reported once through `tracing` and never reach the caller.
    pub async fn request<F>(
        &self,
        target: &str,
        decode: Decode,
        continuation: F,
    ) -> bool
    where
        F: FnOnce(Reply),
    {
        match self.fetch(target, decode).await {
            Ok(Some(reply)) => {
                continuation(reply);
                true
            }
            Ok(None) => false,
            Err(err) => {
                error!("Request to {} failed: {}", target, err);
                false
            }
        }
    }

    /// Envelope mode request, `continuation` receives the `response` value.
    pub async fn request_value<F>(&self, target: &str, continuation: F) -> bool
    where
        F: FnOnce(JsonValue),
    {
        self.request(target, Decode::Envelope, |reply| {
            if let Reply::Value(value) = reply {
                continuation(value);
            }
        })
        .await
    }

    /// Raw mode request for fire-and-forget commands.
    pub async fn request_raw<F>(&self, target: &str, continuation: F) -> bool
    where
        F: FnOnce(),
    {
        self.request(target, Decode::Raw, |_| continuation()).await
    }

    /// Perform the request without swallowing errors.
    ///
    /// `Ok(None)` means the server answered but there is nothing to report:
    /// an envelope without a `response` field, or the `-1` sentinel.
    ///
    /// # Errors
    /// On network failure, non-success status, unparseable envelope body or
    /// a target that cannot be turned into a URL.
    pub async fn fetch(
        &self,
        target: &str,
        decode: Decode,
    ) -> Result<Option<Reply>, GatewayError> {
        let url = self.resolve(target)?;

        let response = self.client.get(url).send().await?.error_for_status()?;

        match decode {
            Decode::Raw => Ok(Some(Reply::Done)),
            Decode::Envelope => {
                let body = response.bytes().await?;
                Ok(decode_envelope(&body)?.map(Reply::Value))
            }
        }
    }

    fn resolve(&self, target: &str) -> Result<Url, GatewayError> {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }

        let Some(base) = &self.base_url else {
            return Err(GatewayError::InvalidTarget(
                target.to_string(),
                "relative target without a base url".to_string(),
            ));
        };

        base.join(target).map_err(|err| {
            GatewayError::InvalidTarget(target.to_string(), err.to_string())
        })
    }
}

/// Extract the `response` field of an envelope body.
///
/// # Errors
/// If the body is not JSON at all.
pub fn decode_envelope(body: &[u8]) -> Result<Option<JsonValue>, serde_json::Error> {
    let parsed: JsonValue = serde_json::from_slice(body)?;

    let JsonValue::Object(mut envelope) = parsed else {
        debug!("Response body is not an envelope object, ignoring");
        return Ok(None);
    };

    let Some(response) = envelope.remove("response") else {
        debug!("Envelope without a response field, ignoring");
        return Ok(None);
    };

    if is_no_value(&response) {
        debug!("Envelope carries the no-value sentinel, ignoring");
        return Ok(None);
    }

    Ok(Some(response))
}

fn is_no_value(response: &JsonValue) -> bool {
    match response {
        JsonValue::Number(number) => {
            number.as_i64() == Some(NO_VALUE_SENTINEL)
                || number.as_f64().is_some_and(|float| {
                    (float + 1.0).abs() < f64::EPSILON
                })
        }
        JsonValue::String(text) => {
            text.trim().parse::<i64>() == Ok(NO_VALUE_SENTINEL)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::start_mock_server;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn gateway_for(base: &str) -> Gateway {
        Gateway::new(&GatewayConfig {
            timeout_secs: 2,
            base_url: Some(base.to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_decode_envelope_value() {
        assert_eq!(decode_envelope(br#"{"response": 7}"#).unwrap(), Some(json!(7)));
        assert_eq!(
            decode_envelope(br#"{"response": {"level": 3}}"#).unwrap(),
            Some(json!({"level": 3}))
        );
    }

    #[test]
    fn test_decode_envelope_null_response_is_delivered() {
        assert_eq!(
            decode_envelope(br#"{"response": null}"#).unwrap(),
            Some(JsonValue::Null)
        );
    }

    #[test]
    fn test_decode_envelope_sentinel() {
        assert_eq!(decode_envelope(br#"{"response": -1}"#).unwrap(), None);
        assert_eq!(decode_envelope(br#"{"response": -1.0}"#).unwrap(), None);
        assert_eq!(decode_envelope(br#"{"response": "-1"}"#).unwrap(), None);
        assert_eq!(decode_envelope(br#"{"response": -2}"#).unwrap(), Some(json!(-2)));
        assert_eq!(
            decode_envelope(br#"{"response": -0.5}"#).unwrap(),
            Some(json!(-0.5))
        );
    }

    #[test]
    fn test_decode_envelope_missing_field() {
        assert_eq!(decode_envelope(b"{}").unwrap(), None);
        assert_eq!(decode_envelope(b"[1, 2]").unwrap(), None);
    }

    #[test]
    fn test_decode_envelope_malformed() {
        assert!(decode_envelope(b"<html>").is_err());
    }

    #[test]
    fn test_relative_target_needs_base() {
        let gateway = Gateway::new(&GatewayConfig::default()).unwrap();

        assert!(matches!(
            gateway.resolve("/on"),
            Err(GatewayError::InvalidTarget(_, _))
        ));
        assert_eq!(
            gateway.resolve("http://device.local/on").unwrap().as_str(),
            "http://device.local/on"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Gateway::new(&GatewayConfig {
            timeout_secs: 1,
            base_url: Some("not a url".to_string()),
        });

        assert!(matches!(result, Err(GatewayError::InvalidTarget(_, _))));
    }

    #[tokio::test]
    async fn test_envelope_value_invokes_continuation() {
        let base = start_mock_server().await;
        let gateway = gateway_for(&base);
        let received = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&received);
        let delivered = gateway
            .request_value("/envelope/value", move |value| {
                *sink.lock().unwrap() = Some(value);
            })
            .await;

        assert!(delivered);
        assert_eq!(*received.lock().unwrap(), Some(json!(7)));
    }

    #[tokio::test]
    async fn test_envelope_without_value_skips_continuation() {
        let base = start_mock_server().await;
        let gateway = gateway_for(&base);

        for target in ["/envelope/sentinel", "/envelope/empty", "/malformed"] {
            let mut called = false;
            let delivered = gateway
                .request(target, Decode::Envelope, |_| called = true)
                .await;

            assert!(!delivered, "{target} should not deliver");
            assert!(!called, "{target} should not run the continuation");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let base = start_mock_server().await;
        let gateway = gateway_for(&base);

        let result = gateway.fetch("/malformed", Decode::Envelope).await;

        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    /// Log lines written by the subscriber installed in a test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn take_error_lines(&self) -> usize {
            let bytes = std::mem::take(&mut *self.0.lock().unwrap());
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains("ERROR"))
                .count()
        }
    }

    #[tokio::test]
    async fn test_failures_are_logged_once() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let base = start_mock_server().await;
        let gateway = gateway_for(&base);

        assert!(!gateway.request("/malformed", Decode::Envelope, |_| {}).await);
        assert_eq!(logs.take_error_lines(), 1);

        assert!(!gateway.request_raw("/fail", || {}).await);
        assert_eq!(logs.take_error_lines(), 1);

        for target in ["/envelope/sentinel", "/envelope/empty"] {
            assert!(!gateway.request(target, Decode::Envelope, |_| {}).await);
            assert_eq!(logs.take_error_lines(), 0, "{target} is not a failure");
        }
    }

    #[tokio::test]
    async fn test_raw_mode_ignores_body() {
        let base = start_mock_server().await;
        let gateway = gateway_for(&base);
        let mut called = false;

        let delivered = gateway.request_raw("/malformed", || called = true).await;

        assert!(delivered);
        assert!(called);
    }

    #[tokio::test]
    async fn test_error_status_skips_continuation() {
        let base = start_mock_server().await;
        let gateway = gateway_for(&base);
        let mut called = false;

        let delivered = gateway.request_raw("/fail", || called = true).await;

        assert!(!delivered);
        assert!(!called);
        assert!(matches!(
            gateway.fetch("/fail", Decode::Raw).await,
            Err(GatewayError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_skips_continuation() {
        let gateway = gateway_for("http://127.0.0.1:9");
        let mut called = false;

        let delivered = gateway.request_raw("/on", || called = true).await;

        assert!(!delivered);
        assert!(!called);
    }
}
