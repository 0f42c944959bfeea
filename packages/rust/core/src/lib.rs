//! Core pipeline and domain logic for transdoc.
//!
//! Ties the response parser, the document plan builder and the publisher
//! together behind collaborator traits, so the HTTP surface and the Google
//! adapters stay thin.

pub mod builder;
pub mod generation;
pub mod pipeline;
pub mod publisher;
pub mod service;

pub use builder::DocumentBuilder;
pub use pipeline::{Pipeline, TranslateRequest};
pub use publisher::DocumentPublisher;
pub use service::{
    CreatedDocument, DocumentOp, DocumentService, NoPageTitle, PageTitleSource, TextGenerator,
};
