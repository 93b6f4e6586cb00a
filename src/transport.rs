//! Authenticated HTTP transport for the completion endpoint

use std::time::Duration;
use log::{debug, error, trace};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::builder::{RequestBody, RequestOptions};
use crate::decode::{Decoded, Expect};
use crate::request::{CompletionRequest, CompletionResponse};

pub const COMPLETIONS_PATH: &str = "/api/v1/completions";

const JSON: &str = "application/json";
const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Status codes outside 200..400 are failures
pub fn is_failure_status(status: u16) -> bool
{   !(200..400).contains(&status)
}

/// Owns the connection pool and the credentials for one endpoint
#[derive(Clone)]
pub struct TransportClient
{   http: reqwest::Client
  , base_url: String
  , token: String
}

impl TransportClient
{   pub fn new(
      base_url: &str
    , token: String
    , timeout: Option<Duration>
    ) -> crate::error::Result<Self>
    {   debug!("Creating TransportClient for {}", base_url);
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout
        {   builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })?;
        Ok(TransportClient
        {   http
          , base_url: base_url.trim_end_matches('/').to_string()
          , token
        })
    }

    pub fn base_url(&self) -> &str
    {   &self.base_url
    }

    /// Build a request and attach credentials and JSON content type
    pub fn new_request(
      &self
    , cancel: &CancellationToken
    , method: Method
    , url: &str
    , options: RequestOptions
    ) -> crate::error::Result<reqwest::Request>
    {   let mut request = crate::builder::build(cancel, method, url, options)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
          .map_err(|e| {
            error!("Auth token is not a valid header value");
            crate::error::Error::Construction(e.to_string())
          })?;
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        Ok(request)
    }

    /// Send a request and decode the body the way `expect` asks
    pub async fn send_request<T: DeserializeOwned>(
      &self
    , cancel: &CancellationToken
    , mut request: reqwest::Request
    , expect: Expect
    ) -> crate::error::Result<Decoded<T>>
    {   let headers = request.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_UTF8));
        if !headers.contains_key(CONTENT_TYPE)
        {   headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        }

        trace!("Sending {} {}", request.method(), request.url());
        let exchange = async {
          let response = self.http.execute(request).await?;
          let status = response.status().as_u16();
          let body = response.bytes().await?;
          Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::select!
        {   biased;
            _ = cancel.cancelled() => {
              error!("Request cancelled in flight");
              return Err(crate::error::Error::Cancelled);
            }
          , result = exchange => result.map_err(|e| {
              error!("HTTP error: {}", e);
              crate::error::Error::from(e)
            })?
        };
        trace!("Response status: {}", status);

        if is_failure_status(status)
        {   return Err(crate::decode::decode_error_response(status, &body));
        }
        crate::decode::decode_response(&body, expect)
    }

    /// POST a chat completion; streaming requests never reach the network
    pub async fn create_chat_completion(
      &self
    , cancel: &CancellationToken
    , request: &CompletionRequest
    ) -> crate::error::Result<CompletionResponse>
    {   if request.stream
        {   error!("Rejecting streaming completion request");
            return Err(crate::error::Error::StreamingUnsupported);
        }

        let url = format!("{}{}", self.base_url, COMPLETIONS_PATH);
        debug!("Creating chat completion for {}", request.deployment_id);
        let options = RequestOptions::new()
          .with_body(RequestBody::json(request)?);
        let http_request = self.new_request(cancel, Method::POST, &url, options)?;
        self.send_request::<CompletionResponse>(cancel, http_request, Expect::Structured)
          .await?
          .into_structured()
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn failure_status_range()
    {   assert!(is_failure_status(199));
        assert!(!is_failure_status(200));
        assert!(!is_failure_status(302));
        assert!(!is_failure_status(399));
        assert!(is_failure_status(400));
        assert!(is_failure_status(500));
    }

    #[test]
    fn new_request_sets_auth_and_content_type()
    {   let transport = TransportClient::new(
          "http://localhost:9000/",
          "tok".to_string(),
          None
        ).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:9000");
        let request = transport.new_request(
          &CancellationToken::new(),
          Method::POST,
          "http://localhost:9000/api/v1/completions",
          RequestOptions::new()
        ).unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");
        assert_eq!(request.headers()[CONTENT_TYPE], JSON);
    }

    #[test]
    fn token_with_newline_is_a_construction_error()
    {   let transport = TransportClient::new(
          "http://localhost",
          "bad\ntoken".to_string(),
          None
        ).unwrap();
        let err = transport.new_request(
          &CancellationToken::new(),
          Method::GET,
          "http://localhost/",
          RequestOptions::new()
        ).unwrap_err();
        assert!(matches!(err, crate::error::Error::Construction(_)));
    }
}
