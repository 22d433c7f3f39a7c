// src/config/mod.rs
pub mod provider;

pub use provider::{ProviderConfig, ProviderKind};
