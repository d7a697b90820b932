//! faq-mcp - tool server for FAQ search
//!
//! Exposes the hybrid FAQ search engine as a single tool for AI assistants.
//!
//! # Tools
//!
//! - `search_faq` - Search the FAQ corpus for answers to a user question

mod server;

pub use server::{
    FaqMcpServer, FaqMetadata, FaqResult, SearchParams, ServerInfo, ToolInfo, ToolResponse,
    ToolResult,
};
