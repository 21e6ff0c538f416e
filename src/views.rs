//! The resolve pass. Once discovery has indexed the whole corpus, every
//! [`Placeholder`] is replaced by its generated view:
//!
//! * `blogrecent`: every post, newest first.
//! * `blogarchive`: the same posts in one section per year, newest year
//!   first.
//! * `blogtags`: one section per tag, in order of first appearance among the
//!   newest-first posts.
//!
//! Each post is listed as `YYYY-MM-DD <title>` with the title linking to the
//! post, relative to the page that requested the view. Views are never
//! cached; each request is rendered from the index afresh.

use crate::document::{DocId, Document, Inline, Node, Placeholder};
use crate::index::PostIndex;
use crate::post::PostEntry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use url::Url;

/// The documents that generated views may link to: every document in the
/// corpus.
#[derive(Debug, Default)]
pub struct Targets(HashSet<DocId>);

impl Targets {
    pub fn from_documents(documents: &[Document]) -> Targets {
        Targets(documents.iter().map(|doc| doc.id.clone()).collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }
}

/// Renders views on behalf of one requesting document.
pub struct Resolver<'a> {
    pub index: &'a PostIndex,
    pub targets: &'a Targets,
    pub site_root: &'a Url,
}

impl Resolver<'_> {
    /// Replaces every placeholder in `document` with its rendered view and
    /// returns the number of views rendered.
    pub fn resolve(&self, document: &mut Document) -> Result<usize> {
        let from = document.id.clone();
        document.replace(|node| match node {
            Node::Placeholder(placeholder) => self.render(&from, *placeholder).map(Some),
            _ => Ok(None),
        })
    }

    /// Renders a single view for the document `from`.
    pub fn render(&self, from: &str, placeholder: Placeholder) -> Result<Node> {
        match placeholder {
            Placeholder::Recent => self.recent(from),
            Placeholder::Archive => self.archive(from),
            Placeholder::Tags => self.tags(from),
        }
    }

    fn recent(&self, from: &str) -> Result<Node> {
        self.post_list(from, &self.index.newest_first())
    }

    fn archive(&self, from: &str) -> Result<Node> {
        let mut sections = Vec::new();
        for (year, posts) in group_by_year(&self.index.newest_first()) {
            sections.push(Node::Section {
                id: format!("year-{}", year),
                title: year.to_string(),
                children: vec![self.post_list(from, &posts)?],
            });
        }
        Ok(Node::Container {
            class: "blog-archive".to_owned(),
            children: sections,
        })
    }

    fn tags(&self, from: &str) -> Result<Node> {
        let mut sections = Vec::new();
        for (tag, posts) in group_by_tag(&self.index.newest_first()) {
            sections.push(Node::Section {
                id: tag.anchor(),
                title: tag.name.clone(),
                children: vec![self.post_list(from, &posts)?],
            });
        }
        Ok(Node::Container {
            class: "blog-tags".to_owned(),
            children: sections,
        })
    }

    fn post_list(&self, from: &str, posts: &[&PostEntry]) -> Result<Node> {
        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            items.push(vec![self.post_item(from, post)?]);
        }
        Ok(Node::BulletList(items))
    }

    fn post_item(&self, from: &str, post: &PostEntry) -> Result<Node> {
        if !self.targets.contains(&post.document_id) {
            return Err(Error::MissingHeadingForReference {
                from: from.to_owned(),
                to: post.document_id.clone(),
            });
        }
        Ok(Node::Paragraph(vec![
            Inline::Text(format!("{} ", post.date_pretty())),
            Inline::Reference {
                uri: crate::url::relative_uri(self.site_root, from, &post.document_id)?,
                text: post.title.clone(),
            },
        ]))
    }
}

/// Groups posts that are already sorted newest first into one group per
/// calendar year, newest year first, preserving order within each year.
pub fn group_by_year<'a>(posts: &[&'a PostEntry]) -> Vec<(i32, Vec<&'a PostEntry>)> {
    use chrono::Datelike;

    let mut groups = Vec::new();
    let mut current: Option<(i32, Vec<&'a PostEntry>)> = None;
    for &post in posts {
        let year = post.published.year();
        if let Some((current_year, group)) = current.as_mut() {
            if *current_year == year {
                group.push(post);
                continue;
            }
        }
        if let Some(finished) = current.replace((year, vec![post])) {
            groups.push(finished);
        }
    }

    // The loop only closes a group when the year changes; the oldest year
    // is still open here.
    if let Some(last) = current {
        groups.push(last);
    }
    groups
}

/// Groups posts by tag. Tags appear in the order they are first seen while
/// walking `posts`, and each group keeps the order of `posts`.
pub fn group_by_tag<'a>(
    posts: &[&'a PostEntry],
) -> Vec<(&'a crate::tag::Tag, Vec<&'a PostEntry>)> {
    let mut groups: Vec<(&crate::tag::Tag, Vec<&PostEntry>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for &post in posts {
        for tag in &post.tags {
            match positions.get(tag.name.as_str()) {
                Some(&i) => groups[i].1.push(post),
                None => {
                    positions.insert(&tag.name, groups.len());
                    groups.push((tag, vec![post]));
                }
            }
        }
    }
    groups
}

/// Represents the result of rendering a view.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to render a view.
#[derive(Debug)]
pub enum Error {
    /// Returned when a view would link to a post whose document isn't in
    /// the corpus. Every indexed post comes from a corpus document that had
    /// a title, so this signals a bug rather than bad input.
    MissingHeadingForReference { from: DocId, to: DocId },

    /// Returned when a relative link can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingHeadingForReference { from, to } => write!(
                f,
                "internal error: `{}` references `{}`, which is not in the corpus",
                from, to
            ),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingHeadingForReference { .. } => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
