//! Defines the [`Tag`] type, which represents a [`crate::post::PostEntry`]
//! tag.

use crate::url::relative_uri;
use url::{ParseError, Url};

/// The namespace prefixed onto every tag anchor.
pub const ANCHOR_PREFIX: &str = "tag-";

/// Represents a post tag. Tags keep the spelling from the post declaration;
/// only the anchor is lower-cased.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    /// The tag's name, trimmed but otherwise as written.
    pub name: String,
}

impl Tag {
    pub fn new<S: Into<String>>(name: S) -> Tag {
        Tag { name: name.into() }
    }

    /// The anchor of the tag's section in the tags view, e.g. `tag-nixos`
    /// for `NixOS`. Every document derives the same anchor for the same tag,
    /// so references resolve regardless of build order.
    pub fn anchor(&self) -> String {
        format!("{}{}", ANCHOR_PREFIX, self.name.to_lowercase())
    }

    /// The link from the page of document `from` to this tag's section on
    /// the page of document `tags_page`.
    pub fn reference(
        &self,
        site_root: &Url,
        from: &str,
        tags_page: &str,
    ) -> Result<String, ParseError> {
        Ok(format!(
            "{}#{}",
            relative_uri(site_root, from, tags_page)?,
            self.anchor()
        ))
    }
}
