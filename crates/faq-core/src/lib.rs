//! faq-core - Core types and traits for FAQ search
//!
//! This crate provides the record and result types, the collaborator traits
//! (corpus sources and embedders), configuration and error handling shared by
//! the rest of the faq-search workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{FaqError, Result};
pub use traits::*;
pub use types::*;
