//! Response body decoding

use log::{error, trace};
use serde::de::DeserializeOwned;

/// What the caller wants out of a successful response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect
{   /// Body is discarded
    Nothing
  , /// Body is returned verbatim as text; bytes that are not UTF-8
    /// are a decode error rather than being replaced
    Text
  , /// Body is parsed as JSON
    Structured
}

/// Decoded response body, matching the requested `Expect`
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T>
{   Discarded
  , Text(String)
  , Structured(T)
}

impl<T> Decoded<T>
{   pub fn into_structured(self) -> crate::error::Result<T>
    {   match self
        {   Decoded::Structured(v) => Ok(v)
          , _ => Err(crate::error::Error::Decode(
              "expected a structured response body".to_string()
            ))
        }
    }
}

/// Decode a success body
pub fn decode_response<T: DeserializeOwned>(
  body: &[u8]
, expect: Expect
) -> crate::error::Result<Decoded<T>>
{   match expect
    {   Expect::Nothing => Ok(Decoded::Discarded)
      , Expect::Text => String::from_utf8(body.to_vec())
          .map(Decoded::Text)
          .map_err(|e| {
            error!("Response body is not UTF-8: {}", e);
            crate::error::Error::Decode(e.to_string())
          })
      , Expect::Structured => serde_json::from_slice(body)
          .map(Decoded::Structured)
          .map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::Decode(e.to_string())
          })
    }
}

/// Turn a failure status and its body into an `Error::Upstream`
pub fn decode_error_response(status: u16, body: &[u8])
  -> crate::error::Error
{   trace!("Error body ({}): {}", status, String::from_utf8_lossy(body));
    let parsed = serde_json::from_slice::<crate::request::ErrorResponse>(body);
    let err = match parsed
    {   Ok(crate::request::ErrorResponse { error: Some(detail) }) => {
          let code = detail.code_string();
          crate::error::Error::Upstream
          {   status
            , message: detail.message
            , kind: detail.kind
            , code
          }
        }
      , Ok(crate::request::ErrorResponse { error: None }) => {
          crate::error::Error::Upstream
          {   status
            , message: "response carried no error detail".to_string()
            , kind: None
            , code: None
          }
        }
      , Err(e) => {
          crate::error::Error::Upstream
          {   status
            , message: format!("undecodable error body: {}", e)
            , kind: None
            , code: None
          }
        }
    };
    error!("Upstream failure: {}", err);
    err
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::error::Error;
    use crate::request::CompletionResponse;

    #[test]
    fn text_is_returned_verbatim()
    {   let decoded = decode_response::<CompletionResponse>(
          b"{not json", Expect::Text
        ).unwrap();
        assert_eq!(decoded, Decoded::Text("{not json".to_string()));
    }

    #[test]
    fn invalid_utf8_text_is_a_decode_error()
    {   let err = decode_response::<CompletionResponse>(
          b"ok \xff\xfe", Expect::Text
        ).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn nothing_discards_the_body()
    {   let decoded = decode_response::<CompletionResponse>(
          b"garbage", Expect::Nothing
        ).unwrap();
        assert_eq!(decoded, Decoded::Discarded);
    }

    #[test]
    fn malformed_json_is_a_decode_error()
    {   let err = decode_response::<CompletionResponse>(
          b"{\"choices\": [", Expect::Structured
        ).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn structured_error_envelope()
    {   let err = decode_error_response(
          500, br#"{"error":{"message":"boom","type":"server_error"}}"#
        );
        assert_eq!(err, Error::Upstream
        {   status: 500
          , message: "boom".to_string()
          , kind: Some("server_error".to_string())
          , code: None
        });
    }

    #[test]
    fn garbage_error_body_keeps_status()
    {   let err = decode_error_response(502, b"<html>bad gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("undecodable error body"));
    }

    #[test]
    fn missing_error_detail_keeps_status()
    {   let err = decode_error_response(404, b"{}");
        assert_eq!(err.status(), Some(404));
    }
}
