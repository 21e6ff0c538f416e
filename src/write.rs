//! Templates resolved [`Document`]s and writes them to disk as HTML pages.

use crate::document::{DocId, Document};
use crate::html;
use crate::url::{output_path, relative_uri};
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The page template used when the project doesn't configure one.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ .title }}</title>
<link rel="alternate" type="application/atom+xml" href="{{ .feed_url }}">
</head>
<body>
<nav>
<a href="{{ .home_page }}">Home</a>{{ range .nav }}
<a href="{{ .url }}">{{ .title }}</a>{{ end }}
</nav>
<main>
{{ .body }}
</main>
</body>
</html>
"#;

/// Loads the template at `path`, or [`DEFAULT_TEMPLATE`] when there is none.
pub fn parse_template(path: Option<&Path>) -> Result<Template> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|err| Error::OpenTemplate {
            path: path.to_owned(),
            err,
        })?,
        None => DEFAULT_TEMPLATE.to_owned(),
    };
    let mut template = Template::default();
    template.parse(contents)?;
    Ok(template)
}

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    /// The template applied to every page.
    pub template: &'a Template,

    /// The base URL against which navigation links are made relative.
    pub site_root: &'a Url,

    /// The directory in which the HTML files will be written. A document with
    /// id `2024/12/router` lands at `{output_directory}/2024/12/router.html`.
    pub output_directory: &'a Path,

    /// The URL for the site's home page, typically the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL of the Atom feed.
    pub feed_url: &'a Url,
}

impl Writer<'_> {
    /// Templates every document and writes it to disk. Non-orphan documents
    /// are listed in each page's navigation.
    pub fn write_documents(&self, documents: &[Document]) -> Result<()> {
        let mut nav: Vec<(&DocId, &str)> = documents
            .iter()
            .filter(|doc| !doc.orphan)
            .map(|doc| (&doc.id, title(doc)))
            .collect();
        nav.sort_by(|a, b| a.0.cmp(b.0));

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for document in documents {
            let file_path = self.output_directory.join(output_path(&document.id));
            if let Some(dir) = file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            let page = Page {
                document,
                nav: &nav,
                file_path,
            };
            self.write_page(&page)?;
        }
        Ok(())
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value(self.site_root)?;
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "feed_url".to_owned(),
                Value::String(self.feed_url.to_string()),
            );
        }
        self.template.execute(
            &mut File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        tracing::debug!(page = %page.file_path.display(), "wrote page");
        Ok(())
    }
}

/// The page title: the document's first heading, else its id.
fn title(document: &Document) -> &str {
    document.first_heading().unwrap_or(&document.id)
}

/// An output HTML file. A [`Page`] is converted to a [`Value`] for the
/// template via [`Page::to_value`].
struct Page<'a> {
    document: &'a Document,

    /// `(id, title)` of every document listed in the navigation.
    nav: &'a [(&'a DocId, &'a str)],

    /// The target location on disk for the output file.
    file_path: PathBuf,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value::Object`] with fields `title`,
    /// `body`, `orphan`, and `nav` (an array of `{title, url}` objects whose
    /// URLs are relative to this page).
    fn to_value(&self, site_root: &Url) -> Result<Value> {
        let mut nav = Vec::with_capacity(self.nav.len());
        for (id, title) in self.nav {
            let mut link: HashMap<String, Value> = HashMap::new();
            link.insert("title".to_owned(), Value::String((*title).to_owned()));
            link.insert(
                "url".to_owned(),
                Value::String(relative_uri(site_root, &self.document.id, id)?),
            );
            nav.push(Value::Object(link));
        }

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "title".to_owned(),
            Value::String(title(self.document).to_owned()),
        );
        m.insert(
            "body".to_owned(),
            Value::String(html::render(&self.document.nodes)?),
        );
        m.insert("orphan".to_owned(), Value::Bool(self.document.orphan));
        m.insert("nav".to_owned(), Value::Array(nav));
        Ok(Value::Object(m))
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// Returned when the configured template file can't be read.
    OpenTemplate { path: PathBuf, err: io::Error },

    /// Returned when a navigation link can't be computed.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::OpenTemplate { path, err } => {
                write!(f, "opening template file '{}': {}", path.display(), err)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::OpenTemplate { err, .. } => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
