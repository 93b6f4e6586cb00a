use std::sync::Arc;
use log::{debug, error, trace};
use tokio_util::sync::CancellationToken;

use crate::cache::{Cache, CacheKey, LogSink, SoftFailure, SoftFailureSink};
use crate::config::ClientConfig;
use crate::request::{CompletionRequest, Message};
use crate::transport::TransportClient;

pub const PROVIDER_NAME: &str = "btpopenai";

/// Instruction wrapped around every prompt.
/// `{language}` and `{prompt}` are substituted.
pub const DEFAULT_PROMPT: &str = "Simplify the following Kubernetes error message delimited by triple dashes written in --- {language} --- language; --- {prompt} ---.
Provide the most possible solution in a step by step style in no more than 280 characters. Write the output in the following format:
Error: {Explain error here}
Solution: {Step by step solution here}
";

/// Fill `DEFAULT_PROMPT` in one pass, so placeholder text inside either
/// value is left alone
pub fn render_prompt(language: &str, prompt: &str) -> String
{   DEFAULT_PROMPT
      .split("{prompt}")
      .map(|segment| segment.replace("{language}", language))
      .collect::<Vec<_>>()
      .join(prompt)
}

/// Completion client for an OpenAI-compatible BTP deployment
pub struct BtpClient
{   config: ClientConfig
  , transport: TransportClient
  , soft_failures: Arc<dyn SoftFailureSink>
}

impl BtpClient
{   /// Build a client whose soft failures go to the log
    pub fn new(config: ClientConfig) -> crate::error::Result<Self>
    {   Self::with_soft_failure_sink(config, Arc::new(LogSink))
    }

    pub fn with_soft_failure_sink(
      config: ClientConfig
    , soft_failures: Arc<dyn SoftFailureSink>
    ) -> crate::error::Result<Self>
    {   debug!("Creating BtpClient for model {}", config.model);
        config.validate()?;
        let transport = TransportClient::new(
          &config.base_url,
          config.password.clone(),
          config.timeout()
        )?;
        Ok(BtpClient
        {   config
          , transport
          , soft_failures
        })
    }

    pub fn name(&self) -> &'static str
    {   PROVIDER_NAME
    }

    pub fn language(&self) -> &str
    {   &self.config.language
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn transport(&self) -> &TransportClient
    {   &self.transport
    }

    /// Single user message request carrying the configured sampling settings
    pub fn completion_request(&self, content: String) -> CompletionRequest
    {   CompletionRequest
        {   deployment_id: self.config.model.clone()
          , messages: vec![Message::user(content)]
          , temperature: self.config.temperature
          , top_p: self.config.top_p.unwrap_or_default()
          , max_tokens: self.config.max_tokens.unwrap_or_default()
          , ..CompletionRequest::default()
        }
    }

    /// Ask the endpoint and return the text of the first choice.
    ///
    /// The message is always `DEFAULT_PROMPT`; `_prompt_template` is
    /// accepted for callers that pass one per backend and is not used.
    pub async fn get_completion(
      &self
    , cancel: &CancellationToken
    , prompt: &str
    , _prompt_template: &str
    ) -> crate::error::Result<String>
    {   let content = render_prompt(&self.config.language, prompt);
        let request = self.completion_request(content);
        trace!("Completion request: {:?}", request);

        let response = self.transport
          .create_chat_completion(cancel, &request)
          .await?;

        response.choices.into_iter()
          .next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or_else(|| {
            error!("No choices in response");
            crate::error::Error::NoChoicesInResponse
          })
    }

    pub fn cache_key(&self, prompt: &str) -> CacheKey
    {   if self.config.cache_key_includes_sampling
        {   CacheKey::with_sampling(
              self.name(),
              &self.config.language,
              prompt,
              self.config.temperature,
              self.config.top_p,
              self.config.max_tokens
            )
        } else
        {   CacheKey::new(self.name(), &self.config.language, prompt)
        }
    }

    /// Cached completion for `prompt_parts` joined by single spaces.
    ///
    /// Cache trouble never fails the call: a failed load falls through to
    /// the network, a failed store still returns the fresh text, and an
    /// undecodable entry yields an empty string. Each of these is reported
    /// to the soft failure sink. Earlier BTP clients returned load errors
    /// to the caller; here a load error counts as a cache miss.
    pub async fn parse<S: AsRef<str>>(
      &self
    , cancel: &CancellationToken
    , prompt_parts: &[S]
    , cache: &dyn Cache
    , prompt_template: &str
    ) -> crate::error::Result<String>
    {   let input = prompt_parts.iter()
          .map(|p| p.as_ref())
          .collect::<Vec<_>>()
          .join(" ");
        let key = self.cache_key(&input);

        if !cache.is_cache_disabled() && cache.exists(key.as_str())
        {   match cache.load(key.as_str())
            {   Ok(entry) if !entry.is_empty() => {
                  debug!("Cache hit for {}", key);
                  return match crate::cache::decode_entry(&entry)
                  {   Ok(text) => Ok(text)
                    , Err(e) => {
                        self.soft_failures.report(SoftFailure::Decode
                        {   key: key.to_string()
                          , reason: e.to_string()
                        });
                        Ok(String::new())
                      }
                  };
                }
              , Ok(_) => {
                  debug!("Empty cache entry for {}, refreshing", key);
                }
              , Err(e) => {
                  self.soft_failures.report(SoftFailure::Load
                  {   key: key.to_string()
                    , reason: e.to_string()
                  });
                }
            }
        }

        let response = self
          .get_completion(cancel, &input, prompt_template)
          .await?;

        if let Err(e) = cache.store(
          key.as_str(),
          &crate::cache::encode_entry(&response)
        )
        {   self.soft_failures.report(SoftFailure::Store
            {   key: key.to_string()
              , reason: e.to_string()
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn client(config: ClientConfig) -> BtpClient
    {   BtpClient::new(config).unwrap()
    }

    fn base_config() -> ClientConfig
    {   ClientConfig
        {   password: "tok".to_string()
          , base_url: "http://localhost:1".to_string()
          , model: "gpt-35-turbo".to_string()
          , temperature: 0.3
          , language: "german".to_string()
          , ..ClientConfig::default()
        }
    }

    #[test]
    fn default_prompt_carries_language_and_prompt()
    {   let rendered = render_prompt("english", "pod crashed");
        assert!(rendered.contains("--- english --- language; --- pod crashed ---"));
        assert!(rendered.contains("Error: {Explain error here}"));
    }

    #[test]
    fn placeholders_inside_values_are_not_expanded()
    {   let rendered = render_prompt("{prompt}", "{language}");
        assert!(rendered.contains("--- {prompt} --- language; --- {language} ---"));
    }

    #[test]
    fn request_carries_configured_settings()
    {   let mut config = base_config();
        config.top_p = Some(0.9);
        let request = client(config).completion_request("hi".to_string());
        assert_eq!(request.deployment_id, "gpt-35-turbo");
        assert_eq!(request.messages, vec![Message::user("hi")]);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.top_p, 0.9);
        assert_eq!(request.max_tokens, 0);
        assert!(!request.stream);
    }

    #[test]
    fn cache_key_ignores_sampling_by_default()
    {   let a = client(base_config());
        let mut hot = base_config();
        hot.temperature = 1.5;
        let b = client(hot);
        assert_eq!(a.cache_key("p"), b.cache_key("p"));
        assert_eq!(a.cache_key("p"), CacheKey::new("btpopenai", "german", "p"));
    }

    #[test]
    fn cache_key_can_include_sampling()
    {   let mut cold = base_config();
        cold.cache_key_includes_sampling = true;
        let mut hot = cold.clone();
        hot.temperature = 1.5;
        assert_ne!(
          client(cold).cache_key("p"),
          client(hot).cache_key("p")
        );
    }

    #[test]
    fn invalid_config_is_rejected()
    {   let config = ClientConfig::default();
        assert!(matches!(
          BtpClient::new(config),
          Err(crate::error::Error::InvalidConfiguration(_))
        ));
    }
}
