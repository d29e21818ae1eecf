//! chatrelay - multi-provider AI chat routing
//!
//! Sends a chat request to Gemini, DeepSeek, Claude or OpenAI, rotating
//! through multiple Gemini keys round-robin and falling back once to a
//! designated provider when the requested one fails. Every result carries
//! token usage and an approximate USD cost.
//!
//! ```no_run
//! use chatrelay::{ChatMessage, ProviderId, Router};
//!
//! # async fn run() -> chatrelay::Result<()> {
//! let router = Router::new()?;
//! let reply = router
//!     .call(ProviderId::Claude, &[ChatMessage::user("Give me a Rust interview question")], "")
//!     .await?;
//! println!("{} ({} tokens, ${:.5})", reply.content, reply.tokens, reply.cost_usd);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod cost;
pub mod error;
pub mod offline;
pub mod provider;
pub mod router;

pub use api::{CallResult, ChatMessage, Role};
pub use config::{ConfigLoader, ProviderConfig, ProvidersConfig, RouterConfig};
pub use cost::CostEstimator;
pub use error::{RelayError, Result};
pub use provider::{ProviderAdapter, ProviderId, WireFormat};
pub use router::{Credential, FallbackPolicy, KeyPool, KeyPoolStats, ProviderInfo, Router};
