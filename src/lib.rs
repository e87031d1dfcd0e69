// Public modules
pub mod catalog;
pub mod challenge;
pub mod chat;
pub mod client;
pub mod error;
pub mod input;
pub mod observability;
pub mod render;
pub mod reply;

// Re-exports
pub use challenge::{AesChallenge, ChallengeSolver};
pub use client::ProxyClient;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use reply::{ReplyExtractor, RegexReplyExtractor};
