//! Shared types, error model, and configuration for Transdoc.
//!
//! This crate is the foundation depended on by all other Transdoc crates.
//! It provides:
//! - [`TransdocError`], the unified error type
//! - Domain types ([`ContentBlock`], [`StyleRange`], [`DocumentPlan`], [`PublishReport`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocumentsConfig, GenerationConfig, LexiconConfig, ServerConfig, TitleConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_token,
    validate_service_config,
};
pub use error::{Result, TransdocError};
pub use types::{
    ContentBlock, DocumentHandle, DocumentPlan, Insertion, PublishReport, SectionKind,
    SectionSpan, ShareOutcome, StyleKind, StyleRange, text_len,
};
