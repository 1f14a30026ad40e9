//! Request execution and response-shape decoding.
//!
//! Container Station answers HTTP 200 for nearly everything and reports
//! failures as `{"error": {...}}` in place of the payload the endpoint
//! normally returns. The two shapes share no reliable field, so the body is
//! classified by peeking at its first key before it is decoded, and then
//! decoded exactly once into whichever type the peek selected.

use crate::client::ContainerStationClient;
use crate::error::{ApiError, Result, SdkError, TransportError};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

/// How many leading bytes of a body the error-marker probe looks at.
const PEEK_LIMIT: usize = 64;

const ERROR_KEY: &[u8] = b"\"error\"";

/// Outcome of decoding a well-formed 200 body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> Decoded<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            Decoded::Success(value) => Ok(value),
            Decoded::Failure(err) => Err(SdkError::Api(err)),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Whether the first key of the JSON object in `body` is `"error"`.
///
/// Only the first [`PEEK_LIMIT`] bytes are inspected and nothing is parsed;
/// an `"error"` key anywhere but first does not count.
pub fn has_error_marker(body: &[u8]) -> bool {
    let prefix = &body[..body.len().min(PEEK_LIMIT)];
    match skip_whitespace(prefix).split_first() {
        Some((b'{', rest)) => skip_whitespace(rest).starts_with(ERROR_KEY),
        _ => false,
    }
}

/// Decode `body` as either `T` or the embedded error object.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<Decoded<T>> {
    if has_error_marker(body) {
        let envelope: ErrorEnvelope = serde_json::from_slice(body)?;
        Ok(Decoded::Failure(envelope.error))
    } else {
        serde_json::from_slice(body).map(Decoded::Success)
    }
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let n = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .count();
    &bytes[n..]
}

fn is_blank(body: &[u8]) -> bool {
    skip_whitespace(body).is_empty()
}

/// Blank, `null`, or `{}`: the forms a successful call with no payload takes.
fn is_empty_payload(body: &[u8]) -> bool {
    let body = skip_whitespace(body);
    if body.is_empty() {
        return true;
    }
    if let Some(rest) = body.strip_prefix(b"null") {
        return is_blank(rest);
    }
    match body.split_first() {
        Some((b'{', rest)) => matches!(
            skip_whitespace(rest).split_first(),
            Some((b'}', tail)) if is_blank(tail)
        ),
        _ => false,
    }
}

impl ContainerStationClient {
    /// Run `fut` unless this handle's cancellation token fires first.
    pub(crate) async fn cancellable<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;

            _ = self.cancel_token().cancelled() => Err(TransportError::Cancelled.into()),
            result = fut => result,
        }
    }

    /// Execute a request and enforce the 200-only envelope.
    ///
    /// Rejected responses are drained before the error is returned. Must be
    /// awaited inside [`Self::cancellable`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build().map_err(TransportError::from)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let start = Instant::now();
        let response = self
            .http()
            .execute(request)
            .await
            .map_err(TransportError::from)?;
        let status = response.status();

        debug!(
            %method,
            %path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Container Station response"
        );

        if status != StatusCode::OK {
            let _ = response.bytes().await;
            return Err(TransportError::Status {
                status,
                method,
                path,
            }
            .into());
        }

        Ok(response)
    }

    /// Execute a request and read its whole body.
    async fn exchange(&self, request: RequestBuilder) -> Result<(String, bytes::Bytes)> {
        self.cancellable(async {
            let response = self.send(request).await?;
            let path = response.url().path().to_string();
            let body = response.bytes().await.map_err(TransportError::from)?;
            Ok::<_, SdkError>((path, body))
        })
        .await
    }

    /// Execute a request and decode the body as `T` or an embedded error.
    pub(crate) async fn dispatch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (path, body) = self.exchange(request).await?;
        decode(&path, &body)
    }

    /// Like [`Self::dispatch`], but an empty payload (blank, `null` or `{}`)
    /// is a successful `None`.
    pub(crate) async fn dispatch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        let (path, body) = self.exchange(request).await?;
        if is_empty_payload(&body) {
            debug!(%path, "empty response body");
            return Ok(None);
        }
        decode(&path, &body).map(Some)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T> {
    let decoded = decode_body::<T>(body).map_err(|source| SdkError::Decode {
        path: path.to_string(),
        source,
    })?;

    if let Decoded::Failure(err) = &decoded {
        debug!(%path, code = ?err.code, message = ?err.message, "embedded API error");
    }

    decoded.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Container, ContainerType, LoginResponse, PortUsage};
    use serde_json::json;

    #[test]
    fn test_error_marker_compact() {
        assert!(has_error_marker(br#"{"error":{"code":401}}"#));
    }

    #[test]
    fn test_error_marker_pretty_printed() {
        let body = serde_json::to_vec_pretty(&json!({
            "error": {"code": 500, "message": "internal"}
        }))
        .unwrap();
        assert!(has_error_marker(&body));
        assert!(has_error_marker(b"  \r\n{ \t\"error\" : {}}"));
    }

    #[test]
    fn test_error_marker_requires_first_key() {
        assert!(!has_error_marker(br#"{"used":false,"error":{"code":1}}"#));
        assert!(!has_error_marker(br#"{"errors":[]}"#));
        assert!(!has_error_marker(br#"[{"error":{}}]"#));
        assert!(!has_error_marker(b""));
        assert!(!has_error_marker(b"{"));
    }

    #[test]
    fn test_error_marker_outside_peek_window() {
        let mut body = b"{".to_vec();
        body.extend(std::iter::repeat(b' ').take(PEEK_LIMIT));
        body.extend_from_slice(br#""error":{"code":1}}"#);
        assert!(!has_error_marker(&body));
    }

    #[test]
    fn test_decode_success_matches_direct_decode() {
        let body = json!({
            "anonymous": false,
            "isAdmin": true,
            "logintime": "2024-01-15 10:00:00",
            "username": "admin"
        })
        .to_string();

        let direct: LoginResponse = serde_json::from_str(&body).unwrap();
        let decoded = decode_body::<LoginResponse>(body.as_bytes()).unwrap();
        assert_eq!(decoded, Decoded::Success(direct));
    }

    #[test]
    fn test_decode_failure() {
        let body = json!({"error": {"code": 401, "message": "bad credentials"}}).to_string();
        let decoded = decode_body::<LoginResponse>(body.as_bytes()).unwrap();
        assert_eq!(
            decoded,
            Decoded::Failure(ApiError {
                code: Some(401),
                message: Some("bad credentials".to_string()),
            })
        );

        let err = decoded.into_result().unwrap_err();
        assert_eq!(err.api_code(), Some(401));
    }

    #[test]
    fn test_decode_failure_without_fields() {
        let decoded = decode_body::<PortUsage>(br#"{"error":{}}"#).unwrap();
        assert_eq!(decoded, Decoded::Failure(ApiError::default()));
    }

    #[test]
    fn test_decode_sequence() {
        let body = json!([{"id": "c1", "name": "web", "type": "docker", "cpu": 1.2}]).to_string();
        let decoded = decode_body::<Vec<Container>>(body.as_bytes()).unwrap();
        match decoded {
            Decoded::Success(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].id, "c1");
                assert_eq!(list[0].kind, ContainerType::Docker);
            }
            Decoded::Failure(err) => panic!("unexpected failure: {err}"),
        }
    }

    #[test]
    fn test_decode_neither_shape() {
        assert!(decode_body::<Vec<Container>>(br#"{"used": true}"#).is_err());
        assert!(decode_body::<PortUsage>(br#"{"used": "maybe"}"#).is_err());
        assert!(decode_body::<PortUsage>(br#"{"error": "boom"}"#).is_err());
        assert!(decode_body::<PortUsage>(br#"{"error": null}"#).is_err());
        assert!(decode_body::<PortUsage>(b"<html></html>").is_err());
    }

    #[test]
    fn test_decode_reports_path() {
        let err = decode::<PortUsage>("/containerstation/api/v1/system/port/tcp/80", b"nope")
            .unwrap_err();
        match err {
            SdkError::Decode { path, .. } => {
                assert_eq!(path, "/containerstation/api/v1/system/port/tcp/80")
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_body() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \n"));
        assert!(!is_blank(b"{}"));
    }

    #[test]
    fn test_empty_payload() {
        assert!(is_empty_payload(b""));
        assert!(is_empty_payload(b" \n"));
        assert!(is_empty_payload(b"null"));
        assert!(is_empty_payload(b" null\n"));
        assert!(is_empty_payload(b"{}"));
        assert!(is_empty_payload(b"{ \n }\n"));

        assert!(!is_empty_payload(b"nullx"));
        assert!(!is_empty_payload(b"{} {}"));
        assert!(!is_empty_payload(br#"{"id":"c1"}"#));
        assert!(!is_empty_payload(br#"{"error":{}}"#));
        assert!(!is_empty_payload(b"[]"));
    }
}
