//! Wire types for the chat completion endpoint

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn user(content: impl Into<String>) -> Self
    {   Message { role: Role::User, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self
    {   Message { role: Role::System, content: content.into() }
    }
}

fn is_zero_f32(v: &f32) -> bool
{   *v == 0.0
}

fn is_zero_u32(v: &u32) -> bool
{   *v == 0
}

fn is_false(v: &bool) -> bool
{   !*v
}

/// Chat completion request body
///
/// Everything except `deployment_id` and `messages` is left off the wire
/// while it holds its zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionRequest
{   pub deployment_id: String
  , pub messages: Vec<Message>
  , #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32
  , #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32
  , #[serde(skip_serializing_if = "is_zero_f32")]
    pub top_p: f32
  , #[serde(skip_serializing_if = "is_zero_u32")]
    pub n: u32
  , #[serde(skip_serializing_if = "is_false")]
    pub stream: bool
  , #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>
  , #[serde(skip_serializing_if = "is_zero_f32")]
    pub presence_penalty: f32
  , #[serde(skip_serializing_if = "is_zero_f32")]
    pub frequency_penalty: f32
  , /// Keys are token ids from the tokenizer, not words
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub logit_bias: BTreeMap<String, i32>
  , #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<serde_json::Value>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub index: Option<u32>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

/// Error envelope returned on failure statuses
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorResponse
{   #[serde(default)]
    pub error: Option<ErrorDetail>
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDetail
{   #[serde(default)]
    pub message: String
  , #[serde(default, rename = "type")]
    pub kind: Option<String>
  , /// Some backends send a number here, others a string
    #[serde(default)]
    pub code: Option<serde_json::Value>
  , #[serde(default)]
    pub param: Option<String>
}

impl ErrorDetail
{   pub fn code_string(&self) -> Option<String>
    {   match &self.code
        {   None | Some(serde_json::Value::Null) => None
          , Some(serde_json::Value::String(s)) => Some(s.clone())
          , Some(other) => Some(other.to_string())
        }
    }
}
