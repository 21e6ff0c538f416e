//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the sources
//! ([`crate::parser`]), discovering posts into the [`PostIndex`]
//! ([`crate::index`]), resolving the generated views ([`crate::views`]),
//! rendering pages ([`crate::write`]), copying the static directory, and
//! writing the Atom feed ([`crate::feed`]).

use crate::config::{Config, Error as ConfigError};
use crate::document::{DocId, Document, Placeholder};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::index::{Discovery, Error as IndexError, PostIndex};
use crate::parser::{Error as ParseError, Parser};
use crate::views::{Error as ViewsError, Resolver, Targets};
use crate::write::{parse_template, Error as WriteError, Writer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Builds the site from a [`Config`] object. Every view and the feed are
/// produced in memory before the first file is written, so a malformed post
/// leaves the output directory untouched.
pub fn build_site(config: &Config) -> Result<()> {
    let mut documents =
        Parser::new(&config.source_directory).parse_documents(config.threads)?;
    info!(documents = documents.len(), "parsed sources");

    let targets = Targets::from_documents(&documents);
    let tags_page = tags_page(&documents, &targets, config.tags_page.as_deref())?;

    // Discovery: the only pass that mutates the index.
    let mut index = PostIndex::new();
    let discovery = Discovery {
        site_root: &config.site_root,
        tags_page: tags_page.as_deref(),
    };
    for document in documents.iter_mut() {
        discovery.discover(&mut index, document)?;
    }
    info!(posts = index.len(), "discovered posts");

    let resolver = Resolver {
        index: &index,
        targets: &targets,
        site_root: &config.site_root,
    };
    let mut views = 0;
    for document in documents.iter_mut().filter(|doc| doc.has_placeholders()) {
        views += resolver.resolve(document)?;
    }
    info!(views, "resolved views");

    let template = parse_template(config.template.as_deref())?;

    let mut feed = Vec::new();
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.site_root.to_string(),
            author: config.author.clone(),
            subtitle: config.subtitle.clone(),
            copyright: config.copyright.clone(),
            language: config.language.clone(),
            home_page: config.site_root.clone(),
            feed_url: config.feed_url.clone(),
            time_zone: config.time_zone,
        },
        &index,
        &mut feed,
    )?;

    let writer = Writer {
        template: &template,
        site_root: &config.site_root,
        output_directory: &config.output_directory,
        home_page: &config.site_root,
        feed_url: &config.feed_url,
    };
    writer.write_documents(&documents)?;
    info!(
        pages = documents.len(),
        output = %config.output_directory.display(),
        "wrote pages"
    );

    if let Some(static_directory) = &config.static_directory {
        copy_dir(static_directory, &config.output_directory)?;
    }

    if let Some(dir) = config.feed_file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&config.feed_file, feed)?;
    info!(feed = %config.feed_file.display(), entries = index.len(), "wrote feed");

    Ok(())
}

/// Picks the document that tag references point at: the configured one,
/// else the first document that asks for the tags view.
fn tags_page(
    documents: &[Document],
    targets: &Targets,
    configured: Option<&str>,
) -> Result<Option<DocId>> {
    match configured {
        Some(id) if targets.contains(id) => Ok(Some(id.to_owned())),
        Some(id) => Err(Error::UnknownTagsPage(id.to_owned())),
        None => Ok(documents
            .iter()
            .find(|doc| doc.requests(Placeholder::Tags))
            .map(|doc| doc.id.clone())),
    }
}

/// Recursively copies the contents of `src` into `dst`, creating directories
/// as needed and overwriting existing files.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src) {
        let entry = result?;
        let relative = entry.path().strip_prefix(src).map_err(|err| Error::Copy {
            path: entry.path().to_owned(),
            err: std::io::Error::new(std::io::ErrorKind::Other, err),
        })?;
        let target = dst.join(relative);
        let copied = if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
        } else {
            std::fs::copy(entry.path(), &target).map(|_| ())
        };
        copied.map_err(|err| Error::Copy {
            path: entry.path().to_owned(),
            err,
        })?;
    }
    tracing::debug!(from = %src.display(), to = %dst.display(), "copied static files");
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// discovery, view resolution, writing, copying static files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading configuration.
    Config(ConfigError),

    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for malformed post declarations.
    Index(IndexError),

    /// Returned for errors rendering generated views.
    Views(ViewsError),

    /// Returned when the configured tags page isn't a document in the
    /// corpus.
    UnknownTagsPage(DocId),

    /// Returned for errors writing [`Document`]s to disk as HTML files.
    Write(WriteError),

    /// Returned for errors building the feed.
    Feed(FeedError),

    /// Returned for WalkDir errors while copying the static directory.
    WalkDir(walkdir::Error),

    /// Returned for I/O problems while copying static files.
    Copy { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Views(err) => err.fmt(f),
            Error::UnknownTagsPage(id) => {
                write!(f, "tags_page `{}` is not a document in the source directory", id)
            }
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Copy { path, err } => {
                write!(f, "copying static file '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Views(err) => Some(err),
            Error::UnknownTagsPage(_) => None,
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Copy { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl From<ViewsError> for Error {
    fn from(err: ViewsError) -> Error {
        Error::Views(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
