//! The discovery pass. [`Discovery::discover`] pulls the post declaration out
//! of each document, validates it into a [`PostEntry`], and records it in the
//! [`PostIndex`] that the build orchestrator owns and later lends to the
//! resolve and feed passes.

use crate::document::{DocId, Document, Node};
use crate::post::{self, PostEntry};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Every post discovered in one build, in discovery order.
#[derive(Debug, Default)]
pub struct PostIndex {
    entries: Vec<PostEntry>,
    positions: HashMap<DocId, usize>,
}

impl PostIndex {
    pub fn new() -> PostIndex {
        PostIndex::default()
    }

    /// Records `entry` under its document identifier. A second entry for the
    /// same document replaces the first but keeps its discovery position.
    pub fn insert(&mut self, entry: PostEntry) {
        match self.positions.get(&entry.document_id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.positions
                    .insert(entry.document_id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries sorted by published date, most recent first.
    /// Posts with the same date keep their discovery order.
    pub fn newest_first(&self) -> Vec<&PostEntry> {
        let mut posts: Vec<&PostEntry> = self.entries.iter().collect();
        posts.sort_by(|a, b| b.published.cmp(&a.published));
        posts
    }

    /// Returns the entries sorted by published date, oldest first. Posts
    /// with the same date keep their discovery order.
    pub fn oldest_first(&self) -> Vec<&PostEntry> {
        let mut posts: Vec<&PostEntry> = self.entries.iter().collect();
        posts.sort_by_key(|post| post.published);
        posts
    }
}

/// Extracts post declarations from documents.
pub struct Discovery<'a> {
    /// The base URL that post URLs are joined onto.
    pub site_root: &'a Url,

    /// The document whose page holds the tags view; tag references in post
    /// metadata blocks point there.
    pub tags_page: Option<&'a str>,
}

impl Discovery<'_> {
    /// Replaces each post declaration in `document` with its metadata block,
    /// inserts the resulting entry into `index`, and marks the document as an
    /// orphan. If a document declares more than one post, the last one wins.
    /// Returns whether the document is a post.
    pub fn discover(&self, index: &mut PostIndex, document: &mut Document) -> Result<bool> {
        let heading = document.first_heading().map(str::to_owned);
        let url = crate::url::document_url(self.site_root, &document.id)?;
        let id = document.id.clone();

        let mut entries = Vec::new();
        let declarations = document.replace(|node| match node {
            Node::Post(declaration) => {
                let entry =
                    PostEntry::from_declaration(&id, heading.as_deref(), declaration, url.clone())?;
                let block = entry.metadata_block(self.site_root, self.tags_page)?;
                entries.push(entry);
                Ok::<_, Error>(Some(block))
            }
            _ => Ok(None),
        })?;

        if declarations > 1 {
            tracing::warn!(document = %id, declarations, "document declares more than one post; keeping the last");
        }
        for entry in entries {
            tracing::debug!(document = %id, date = %entry.published, title = %entry.title, "discovered post");
            index.insert(entry);
        }

        document.orphan |= declarations > 0;
        Ok(declarations > 0)
    }
}

/// Represents the result of a discovery operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to index a document.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post declaration is invalid.
    Post(post::Error),

    /// Returned when the document's URL can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Post(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Post(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<post::Error> for Error {
    /// Converts a [`post::Error`] into an [`Error`]. It allows us to use the
    /// `?` operator when validating declarations.
    fn from(err: post::Error) -> Error {
        Error::Post(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
