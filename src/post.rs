//! Defines [`PostDeclaration`], the raw contents of a `blogpost` directive, and
//! [`PostEntry`], the validated post metadata stored in
//! [`crate::index::PostIndex`]. Also builds the metadata block that takes the
//! declaration's place in the rendered post.

use crate::document::{DocId, Inline, Node};
use crate::tag::Tag;
use chrono::{NaiveDate, ParseError};
use std::fmt;
use url::Url;

/// The only accepted format for post dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The `blogpost` directive as written in a document. Nothing here has been
/// validated yet; see [`PostEntry::from_declaration`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostDeclaration {
    /// The directive's positional argument.
    pub date: Option<String>,

    /// The `tags` option, already split with [`split_list`].
    pub tags: Vec<String>,

    /// The `category` option, already split with [`split_list`].
    pub category: Vec<String>,

    /// The `title` option, overriding the document heading.
    pub title: Option<String>,

    /// The `updated` option.
    pub updated: Option<String>,
}

/// Splits a comma-separated option value. Every token is trimmed and empty
/// tokens are dropped, so an empty or all-whitespace value yields no items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Metadata for a single post.
#[derive(Clone, Debug, PartialEq)]
pub struct PostEntry {
    /// The document that declared the post.
    pub document_id: DocId,

    pub title: String,

    pub tags: Vec<Tag>,

    /// Kept apart from `tags`; no view merges the two.
    pub category: Vec<String>,

    pub published: NaiveDate,

    pub updated: Option<NaiveDate>,

    /// The absolute URL of the post page.
    pub url: Url,
}

impl PostEntry {
    /// Validates a declaration. `heading` is the document's first
    /// heading, used as the title unless the declaration overrides it.
    pub fn from_declaration(
        document_id: &str,
        heading: Option<&str>,
        declaration: &PostDeclaration,
        url: Url,
    ) -> Result<PostEntry> {
        let published = parse_date(
            document_id,
            "date",
            declaration.date.as_deref().unwrap_or_default(),
        )?;
        let updated = match &declaration.updated {
            Some(updated) => Some(parse_date(document_id, "updated", updated)?),
            None => None,
        };
        let title = match (&declaration.title, heading) {
            (Some(title), _) => title.clone(),
            (None, Some(heading)) => heading.to_owned(),
            (None, None) => {
                return Err(Error::MissingTitle {
                    document: document_id.to_owned(),
                })
            }
        };

        Ok(PostEntry {
            document_id: document_id.to_owned(),
            title,
            tags: declaration.tags.iter().map(Tag::new).collect(),
            category: declaration.category.clone(),
            published,
            updated,
            url,
        })
    }

    /// The published date as `YYYY-MM-DD`.
    pub fn date_pretty(&self) -> String {
        self.published.format(DATE_FORMAT).to_string()
    }

    /// Builds the block that replaces the declaration in the post itself: a
    /// date line, a line of tags (only when there are tags), and a rule
    /// separating the metadata from the body. Each tag links to its section
    /// on the page of document `tags_page`; without a tags page the names
    /// are plain text.
    pub fn metadata_block(&self, site_root: &Url, tags_page: Option<&str>) -> Result<Node> {
        let mut children = vec![Node::Paragraph(vec![Inline::Text(format!(
            "Date: {}",
            self.date_pretty()
        ))])];

        if !self.tags.is_empty() {
            let mut inlines = vec![Inline::Text("Tags: ".to_owned())];
            for (i, tag) in self.tags.iter().enumerate() {
                if i > 0 {
                    inlines.push(Inline::Text(", ".to_owned()));
                }
                inlines.push(match tags_page {
                    Some(tags_page) => Inline::Reference {
                        uri: tag.reference(site_root, &self.document_id, tags_page)?,
                        text: tag.name.clone(),
                    },
                    None => Inline::Text(tag.name.clone()),
                });
            }
            children.push(Node::Paragraph(inlines));
        }

        children.push(Node::Transition);
        Ok(Node::Container {
            class: "post-metadata".to_owned(),
            children,
        })
    }
}

fn parse_date(document: &str, field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| Error::MetadataParse {
        document: document.to_owned(),
        field,
        value: value.to_owned(),
        err,
    })
}

/// Represents the result of validating a post declaration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid post declaration. Every variant is fatal to the
/// build.
#[derive(Debug)]
pub enum Error {
    /// Returned when the date or the updated date is missing or isn't
    /// `YYYY-MM-DD`.
    MetadataParse {
        document: DocId,
        field: &'static str,
        value: String,
        err: ParseError,
    },

    /// Returned when a post has neither a `title` option nor a heading.
    MissingTitle { document: DocId },

    /// Returned when a tag link can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MetadataParse {
                document,
                field,
                value,
                err,
            } => write!(
                f,
                "post `{}`: invalid {} `{}` (expected YYYY-MM-DD): {}",
                document, field, value, err
            ),
            Error::MissingTitle { document } => write!(
                f,
                "post `{}`: missing heading; add a heading or a `title` option",
                document
            ),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MetadataParse { err, .. } => Some(err),
            Error::MissingTitle { .. } => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator when building tag links.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
