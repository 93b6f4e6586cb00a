pub mod error;
pub mod config;
pub mod request;
pub mod builder;
pub mod decode;
pub mod transport;
pub mod cache;
pub mod providers;

/*

btpai: chat completions against an OpenAI-compatible BTP deployment,
with a content-addressed cache in front of the network call.

btpai/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── error.rs        # Error type shared by every layer
│   ├── config.rs       # Client configuration
│   ├── request.rs      # Wire types (request, response, error envelope)
│   ├── builder.rs      # Outbound request assembly
│   ├── decode.rs       # Success and error body decoding
│   ├── transport.rs    # Auth headers, send, status classification
│   ├── cache.rs        # Cache trait, keys, entry encoding, soft failures
│   └── providers/
│       ├── mod.rs
│       └── btp.rs      # Completion client and caching wrapper
└── tests/              # End-to-end tests against a mock endpoint

*/

pub use error::{Error, Result};
pub use config::ClientConfig;
pub use request::{
  Choice, CompletionRequest, CompletionResponse, Message, Role
};
pub use cache::{
  Cache, CacheKey, LogSink, SoftFailure, SoftFailureSink
};
pub use providers::btp::{BtpClient, DEFAULT_PROMPT, PROVIDER_NAME};
pub use tokio_util::sync::CancellationToken;
