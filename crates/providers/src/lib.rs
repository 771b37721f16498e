//! LLM Provider implementations for assistd.
//!
//! All providers implement the `assistd_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{Endpoint, ProviderRouter, build_from_config, known_base_url};
