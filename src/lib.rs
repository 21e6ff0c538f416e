//! The library code for the `blogroll` static blog builder. A build runs in
//! distinct passes over an in-memory corpus of documents:
//!
//! 1. Parsing every Markdown source into a [`document::Document`]
//!    ([`crate::parser`], [`crate::markdown`])
//! 2. Discovery: pulling each post declaration into the
//!    [`index::PostIndex`] ([`crate::index`])
//! 3. Resolve: replacing the `blogrecent`, `blogarchive` and `blogtags`
//!    placeholders with views rendered from the complete index
//!    ([`crate::views`])
//! 4. Writing every document as an HTML page ([`crate::write`]) and the
//!    index as an Atom feed ([`crate::feed`])
//!
//! Discovery is the only pass that mutates the index; it is lent immutably
//! to everything after it. Nothing is written until the last pass, so a
//! malformed post fails the build without partial output.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod feed;
pub mod html;
pub mod index;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod tag;
pub mod url;
pub mod views;
pub mod write;
