//! Configuration for the completion client

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Client configuration, fixed once the client is built
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig
{   /// Bearer token sent on every request
    pub password: String
  , /// Endpoint base URL, without the completions path
    pub base_url: String
  , /// Deployment/model identifier
    pub model: String
  , /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32
  , /// Natural language the answer is written in
    #[serde(default = "default_language")]
    pub language: String
  , /// Nucleus sampling, omitted from requests when unset
    #[serde(default)]
    pub top_p: Option<f32>
  , /// Generation limit, omitted from requests when unset
    #[serde(default)]
    pub max_tokens: Option<u32>
  , /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
  , /// Fold temperature, top-p and max tokens into the cache key
    #[serde(default)]
    pub cache_key_includes_sampling: bool
}

fn default_language() -> String
{   "english".to_string()
}

fn default_temperature() -> f32
{   0.7
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   password: String::new()
          , base_url: String::new()
          , model: String::new()
          , temperature: default_temperature()
          , language: default_language()
          , top_p: None
          , max_tokens: None
          , timeout_secs: None
          , cache_key_includes_sampling: false
        }
    }
}

impl fmt::Debug for ClientConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ClientConfig")
          .field("password", &"<redacted>")
          .field("base_url", &self.base_url)
          .field("model", &self.model)
          .field("temperature", &self.temperature)
          .field("language", &self.language)
          .field("top_p", &self.top_p)
          .field("max_tokens", &self.max_tokens)
          .field("timeout_secs", &self.timeout_secs)
          .field(
            "cache_key_includes_sampling",
            &self.cache_key_includes_sampling
          )
          .finish()
    }
}

impl ClientConfig
{   /// Parse configuration from a JSON document
    pub fn from_json_str(json: &str)
      -> crate::error::Result<Self>
    {   let config: ClientConfig = serde_json::from_str(json)
          .map_err(|e| {
            error!("Config parse error: {}", e);
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>)
      -> crate::error::Result<Self>
    {   let path = path.as_ref();
        debug!("Loading client config from {}", path.display());
        let config_str = fs::read_to_string(path)
          .map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        Self::from_json_str(&config_str)
    }

    /// Check the fields a request cannot be built without
    pub fn validate(&self) -> crate::error::Result<()>
    {   if self.base_url.trim().is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "base_url is empty".to_string()
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("base_url {:?}: {}", self.base_url, e)
          )
        })?;
        if self.model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "model is empty".to_string()
            ));
        }
        if !self.temperature.is_finite()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "temperature is not finite".to_string()
            ));
        }
        Ok(())
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration>
    {   self.timeout_secs.map(Duration::from_secs)
    }
}
