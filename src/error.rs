use std::fmt;

/// Custom error type for completion and cache operations
/// Implements Clone so results can cross task boundaries
#[derive(Debug, Clone, PartialEq)]
pub enum Error
{   /// Request could not be assembled (bad URL, body serialization)
    Construction(String)
  , /// A streaming request was handed to a client that only speaks
    /// complete responses
    StreamingUnsupported
  , /// Connection level failure, reported as the transport saw it
    Transport(String)
  , /// Endpoint answered with a status outside 200..400
    Upstream
    {   status: u16
      , message: String
      , kind: Option<String>
      , code: Option<String>
    }
  , /// Success body could not be decoded
    Decode(String)
  , /// Upstream answered with an empty choice list
    NoChoicesInResponse
  , /// The cancellation token fired before the call finished
    Cancelled
  , /// Request timed out
    Timeout
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Cache collaborator failure
    Cache(String)
}

impl Error
{   /// HTTP status carried by an upstream failure
    pub fn status(&self) -> Option<u16>
    {   match self
        {   Error::Upstream { status, .. } => Some(*status)
          , _ => None
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Construction(msg) => {
              write!(f, "Request construction failed: {}", msg)
            }
          , Error::StreamingUnsupported => {
              write!(f,
                "Streaming is not supported by this client"
              )
            }
          , Error::Transport(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::Upstream { status, message, .. } => {
              write!(f,
                "API error (status {}): {}",
                status, message
              )
            }
          , Error::Decode(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::Cancelled => {
              write!(f, "Request was cancelled")
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Cache(msg) => {
              write!(f, "Cache error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else if e.is_builder()
        {   Error::Construction(e.to_string())
        } else
        {   Error::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
