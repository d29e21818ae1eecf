//! Router Module
//!
//! Provider dispatch, credential pools and the fallback policy.

pub mod dispatch;
pub mod fallback;
pub mod key_pool;

pub use dispatch::{ProviderInfo, Router};
pub use fallback::FallbackPolicy;
pub use key_pool::{Credential, KeyPool, KeyPoolStats};
