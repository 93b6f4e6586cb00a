//! Cache collaborator interface, key derivation and entry encoding
//!
//! The cache itself lives outside this crate. Entries are stored as
//! standard base64 so backends that only keep printable text can hold them.
//! Two callers missing on the same key at once both store; the later write
//! wins.

use std::fmt;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::error;
use sha2::{Digest, Sha256};

/// External cache capability
pub trait Cache: Send + Sync
{   fn is_cache_disabled(&self) -> bool;
    fn exists(&self, key: &str) -> bool;
    fn load(&self, key: &str) -> crate::error::Result<String>;
    fn store(&self, key: &str, value: &str) -> crate::error::Result<()>;
}

/// Hex SHA-256 identifying one prompt for one provider and language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey
{   pub fn new(provider: &str, language: &str, prompt: &str) -> Self
    {   Self::from_data(&format!("{}-{}-{}", provider, language, prompt))
    }

    /// Key that also varies with the sampling parameters
    pub fn with_sampling(
      provider: &str
    , language: &str
    , prompt: &str
    , temperature: f32
    , top_p: Option<f32>
    , max_tokens: Option<u32>
    ) -> Self
    {   Self::from_data(&format!(
          "{}-{}-{}-t={}-p={}-m={}",
          provider,
          language,
          prompt,
          temperature,
          top_p.map(|v| v.to_string()).unwrap_or_default(),
          max_tokens.map(|v| v.to_string()).unwrap_or_default()
        ))
    }

    fn from_data(data: &str) -> Self
    {   let digest = Sha256::digest(data.as_bytes());
        CacheKey(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str
    {   &self.0
    }
}

impl fmt::Display for CacheKey
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(&self.0)
    }
}

pub fn encode_entry(text: &str) -> String
{   STANDARD.encode(text.as_bytes())
}

pub fn decode_entry(entry: &str) -> crate::error::Result<String>
{   let bytes = STANDARD.decode(entry).map_err(|e| {
      crate::error::Error::Cache(format!("invalid base64: {}", e))
    })?;
    String::from_utf8(bytes).map_err(|e| {
      crate::error::Error::Cache(format!("invalid UTF-8: {}", e))
    })
}

/// Cache failure that was absorbed instead of returned
#[derive(Debug, Clone, PartialEq)]
pub enum SoftFailure
{   Load { key: String, reason: String }
  , Decode { key: String, reason: String }
  , Store { key: String, reason: String }
}

impl fmt::Display for SoftFailure
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   SoftFailure::Load { key, reason } => {
              write!(f, "error loading cached data for {}: {}", key, reason)
            }
          , SoftFailure::Decode { key, reason } => {
              write!(f, "error decoding cached data for {}: {}", key, reason)
            }
          , SoftFailure::Store { key, reason } => {
              write!(f, "error storing value to cache for {}: {}", key, reason)
            }
        }
    }
}

/// Receives soft failures from the caching wrapper
pub trait SoftFailureSink: Send + Sync
{   fn report(&self, failure: SoftFailure);
}

/// Default sink, writes soft failures to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl SoftFailureSink for LogSink
{   fn report(&self, failure: SoftFailure)
    {   error!("{}", failure);
    }
}
