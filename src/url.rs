//! Maps document identifiers onto output paths and URLs, and computes the
//! page-relative links used inside generated views.

use url::{ParseError, Url};

pub const MARKDOWN_EXTENSION: &str = ".md";
pub const HTML_EXTENSION: &str = ".html";

/// The output path of a document relative to the output root (e.g.
/// `2024/12/router.html` for `2024/12/router`).
pub fn output_path(id: &str) -> String {
    format!("{}{}", id, HTML_EXTENSION)
}

/// The absolute URL of a document. `site_root` must end in a trailing slash;
/// see [`with_trailing_slash`].
pub fn document_url(site_root: &Url, id: &str) -> Result<Url> {
    site_root.join(&output_path(id))
}

/// The link from the page of document `from` to the page of document `to`,
/// relative to `from` (e.g. `../2024/12/router.html`).
pub fn relative_uri(site_root: &Url, from: &str, to: &str) -> Result<String> {
    let target = document_url(site_root, to)?;
    if from == to {
        return Ok(target
            .path_segments()
            .and_then(|segments| segments.last())
            .map(str::to_owned)
            .unwrap_or_else(|| output_path(to)));
    }
    let base = document_url(site_root, from)?;
    Ok(match base.make_relative(&target) {
        Some(relative) => relative,
        None => target.to_string(),
    })
}

/// Appends a trailing slash to the URL's path if it is missing. Without it
/// [`Url::join`] treats the last path segment as a file name and drops it.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

type Result<T> = std::result::Result<T, ParseError>;
