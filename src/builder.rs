//! Assembles outbound HTTP requests

use bytes::Bytes;
use log::{error, trace};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Body of an outbound request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody
{   #[default]
    Empty
  , /// Sent as-is, for payloads that are not JSON (file uploads)
    Raw(Bytes)
  , Json(serde_json::Value)
}

impl RequestBody
{   /// Serialize `body` into a JSON request body
    pub fn json<T: Serialize + ?Sized>(body: &T)
      -> crate::error::Result<Self>
    {   serde_json::to_value(body)
          .map(RequestBody::Json)
          .map_err(|e| {
            error!("Failed to serialize request body: {}", e);
            crate::error::Error::Construction(e.to_string())
          })
    }

    fn into_bytes(self) -> crate::error::Result<Option<Bytes>>
    {   match self
        {   RequestBody::Empty => Ok(None)
          , RequestBody::Raw(bytes) => Ok(Some(bytes))
          , RequestBody::Json(value) => serde_json::to_vec(&value)
              .map(|v| Some(Bytes::from(v)))
              .map_err(|e| {
                error!("Failed to encode request body: {}", e);
                crate::error::Error::Construction(e.to_string())
              })
        }
    }
}

/// Optional parts of a request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions
{   pub body: RequestBody
  , /// Replaces the default header set entirely when present
    pub headers: Option<HeaderMap>
}

impl RequestOptions
{   pub fn new() -> Self
    {   Self::default()
    }

    pub fn with_body(mut self, body: RequestBody) -> Self
    {   self.body = body;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self
    {   self.headers = Some(headers);
        self
    }
}

/// Build a transport-ready request
pub fn build(
  cancel: &CancellationToken
, method: Method
, url: &str
, options: RequestOptions
) -> crate::error::Result<reqwest::Request>
{   if cancel.is_cancelled()
    {   error!("Request to {} cancelled before construction", url);
        return Err(crate::error::Error::Cancelled);
    }

    let parsed = Url::parse(url).map_err(|e| {
      error!("Malformed URL {:?}: {}", url, e);
      crate::error::Error::Construction(
        format!("invalid URL {:?}: {}", url, e)
      )
    })?;

    let body = options.body.into_bytes()?;
    trace!("Building {} {} (body: {} bytes)",
      method,
      parsed,
      body.as_ref().map(|b| b.len()).unwrap_or(0)
    );

    let mut request = reqwest::Request::new(method, parsed);
    if let Some(bytes) = body
    {   *request.body_mut() = Some(reqwest::Body::from(bytes));
    }
    if let Some(headers) = options.headers
    {   *request.headers_mut() = headers;
    }
    Ok(request)
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;
    use reqwest::header::{HeaderValue, ACCEPT};

    fn body_bytes(request: &reqwest::Request) -> Option<Vec<u8>>
    {   request.body()
          .and_then(|b| b.as_bytes())
          .map(|b| b.to_vec())
    }

    #[test]
    fn json_body_is_serialized()
    {   let token = CancellationToken::new();
        let body = RequestBody::json(
          &serde_json::json!({"a": 1})
        ).unwrap();
        let request = build(
          &token,
          Method::POST,
          "http://localhost/api",
          RequestOptions::new().with_body(body)
        ).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(body_bytes(&request).unwrap(), br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn raw_body_passes_through()
    {   let token = CancellationToken::new();
        let raw = Bytes::from_static(b"\x00not json");
        let request = build(
          &token,
          Method::PUT,
          "http://localhost/upload",
          RequestOptions::new().with_body(RequestBody::Raw(raw.clone()))
        ).unwrap();
        assert_eq!(body_bytes(&request).unwrap(), raw.to_vec());
    }

    #[test]
    fn supplied_headers_replace_defaults()
    {   let token = CancellationToken::new();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let request = build(
          &token,
          Method::GET,
          "http://localhost/",
          RequestOptions::new().with_headers(headers)
        ).unwrap();
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.headers()[ACCEPT], "text/plain");
        assert!(request.body().is_none());
    }

    #[test]
    fn unserializable_body_is_a_construction_error()
    {   let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), 3u8);
        let err = RequestBody::json(&bad).unwrap_err();
        assert!(matches!(err, crate::error::Error::Construction(_)));
    }

    #[test]
    fn malformed_url_is_a_construction_error()
    {   let token = CancellationToken::new();
        let err = build(
          &token,
          Method::GET,
          "::not a url",
          RequestOptions::new()
        ).unwrap_err();
        assert!(matches!(err, crate::error::Error::Construction(_)));
    }

    #[test]
    fn cancelled_token_aborts_construction()
    {   let token = CancellationToken::new();
        token.cancel();
        let err = build(
          &token,
          Method::GET,
          "http://localhost/",
          RequestOptions::new()
        ).unwrap_err();
        assert_eq!(err, crate::error::Error::Cancelled);
    }
}
