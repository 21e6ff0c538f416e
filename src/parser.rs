//! Defines the [`Parser`], which loads every Markdown source under a
//! directory into a [`Document`] (see [`crate::markdown`] for the conversion
//! itself).

use crate::document::{DocId, Document};
use crate::markdown;
use crate::url::MARKDOWN_EXTENSION;
use std::fmt;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Parses [`Document`] objects from source files.
pub struct Parser<'a> {
    /// The directory searched (recursively) for `.md` files.
    source_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(source_directory: &'a Path) -> Parser<'a> {
        Parser { source_directory }
    }

    /// Parses every source file, using a pool of `threads` workers when
    /// `threads` is greater than one. Documents are returned sorted by
    /// identifier regardless of how they were parsed, so discovery order is
    /// the same from one build to the next.
    pub fn parse_documents(&self, threads: usize) -> Result<Vec<Document>> {
        let sources = self.sources()?;
        tracing::debug!(
            directory = %self.source_directory.display(),
            sources = sources.len(),
            threads,
            "parsing sources"
        );
        let mut documents = if threads < 2 {
            parse_singlethreaded(sources)?
        } else {
            parse_parallel(sources, threads)?
        };
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    /// Lists the source files as `(id, path)` pairs.
    fn sources(&self) -> Result<Vec<(DocId, PathBuf)>> {
        let mut sources = Vec::new();
        for result in WalkDir::new(self.source_directory) {
            let entry = result?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.to_string_lossy().ends_with(MARKDOWN_EXTENSION)
            {
                // strip_prefix() should never fail; walkdir yields paths
                // under the directory it was given.
                let relative = path
                    .strip_prefix(self.source_directory)
                    .map_err(|_| InvalidFileNameError(path.to_owned()))?;
                sources.push((document_id(relative)?, path.to_owned()));
            }
        }
        Ok(sources)
    }
}

/// Converts a path relative to the source directory into a document
/// identifier: `/`-separated and without the Markdown extension.
fn document_id(relative: &Path) -> Result<DocId> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| InvalidFileNameError(relative.to_owned()))?,
            ),
            _ => return Err(InvalidFileNameError(relative.to_owned()).into()),
        }
    }
    let joined = parts.join("/");
    Ok(match joined.strip_suffix(MARKDOWN_EXTENSION) {
        Some(id) => id.to_owned(),
        None => joined,
    })
}

fn parse_document(id: &str, path: &Path) -> Result<Document> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?
        .read_to_string(&mut contents)?;
    markdown::to_document(id, &contents).map_err(|err| {
        Error::Annotated(
            format!("parsing `{}`", path.display()),
            Box::new(Error::Markdown(err)),
        )
    })
}

fn parse_singlethreaded(sources: Vec<(DocId, PathBuf)>) -> Result<Vec<Document>> {
    sources
        .iter()
        .map(|(id, path)| parse_document(id, path))
        .collect()
}

fn parse_parallel(sources: Vec<(DocId, PathBuf)>, threads: usize) -> Result<Vec<Document>> {
    use crossbeam_channel::unbounded;
    use std::thread;

    let (tx, rx) = unbounded::<(DocId, PathBuf)>();
    let mut workers = Vec::with_capacity(threads);

    for _ in 0..threads {
        let rx = rx.clone();
        workers.push(thread::spawn(move || -> Result<Vec<Document>> {
            let mut documents = Vec::new();
            for (id, path) in rx {
                documents.push(parse_document(&id, &path)?);
            }
            Ok(documents)
        }));
    }
    drop(rx);

    for source in sources {
        // Sending only fails once every worker has exited, in which case
        // joining below surfaces the reason.
        if tx.send(source).is_err() {
            break;
        }
    }
    drop(tx);

    let mut documents = Vec::new();
    for worker in workers {
        documents.extend(worker.join().map_err(|_| Error::WorkerPanicked)??);
    }
    Ok(documents)
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`Document`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading [`Document`] objects.
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file contains a malformed directive.
    Markdown(markdown::Error),

    /// Returned when a source file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source path isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// Returned when a parsing worker panics.
    WorkerPanicked,

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Markdown(err) => err.fmt(f),
            Error::Open { path, err } => {
                write!(f, "opening source file '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::WorkerPanicked => write!(f, "a parsing worker panicked"),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Markdown(err) => Some(err),
            Error::Open { err, .. } => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::WorkerPanicked => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        Error::Markdown(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for directory walking.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
