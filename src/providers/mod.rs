//! Completion backend implementations

pub mod btp;

// Re-export for convenience
pub use btp::BtpClient;
