//! Loads the project file (`blogroll.yaml`) into a [`Config`].

use crate::url::with_trailing_slash;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "blogroll.yaml";

/// Environment variable consulted for the copyright end year. Reproducible
/// builds set it to the last-modified date of the sources.
pub const LAST_MODIFIED_VAR: &str = "NIX_LAST_MODIFIED_DATE";

/// The feed and page author.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

fn default_language() -> String {
    "en".to_owned()
}

fn default_time_zone() -> String {
    "America/Vancouver".to_owned()
}

fn default_feed_path() -> PathBuf {
    PathBuf::from("atom.xml")
}

fn default_source_directory() -> PathBuf {
    PathBuf::from("content")
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,
    title: String,
    author: Author,

    #[serde(default)]
    subtitle: Option<String>,

    #[serde(default)]
    copyright: Option<String>,

    /// First year of the copyright range; the last is the build year.
    #[serde(default)]
    copyright_since: Option<i32>,

    #[serde(default = "default_language")]
    language: String,

    #[serde(default = "default_time_zone")]
    time_zone: String,

    #[serde(default = "default_feed_path")]
    feed_path: PathBuf,

    #[serde(default)]
    tags_page: Option<String>,

    #[serde(default = "default_source_directory")]
    source_directory: PathBuf,

    #[serde(default)]
    static_directory: Option<PathBuf>,

    #[serde(default)]
    template: Option<PathBuf>,
}

/// The resolved build configuration. Paths are absolute or relative to the
/// working directory rather than to the project file.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site's base URL, always ending in `/`.
    pub site_root: Url,
    pub title: String,
    pub author: Author,
    pub subtitle: Option<String>,
    pub copyright: Option<String>,
    pub language: String,

    /// The zone in which post dates are anchored in the feed.
    pub time_zone: Tz,

    pub source_directory: PathBuf,
    pub static_directory: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub output_directory: PathBuf,

    /// Where the feed is written: `output_directory` joined with the
    /// configured feed path.
    pub feed_file: PathBuf,

    /// The feed's absolute URL, used as its self link.
    pub feed_url: Url,

    /// The id of the document whose page holds the tags view. When unset,
    /// the first document with a `blogtags` placeholder is used.
    pub tags_page: Option<String>,

    pub threads: usize,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for the project file
    /// and loads the first one found.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory, threads);
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        tracing::debug!(project = %path.display(), "loaded project file");

        let zone_name = project.time_zone;
        let time_zone: Tz = zone_name.parse().map_err(|err| Error::TimeZone {
            name: zone_name.clone(),
            err: format!("{}", err),
        })?;

        let copyright = match (project.copyright, project.copyright_since) {
            (Some(copyright), _) => Some(copyright),
            (None, Some(since)) => Some(format!(
                "{}-{}, {}",
                since,
                copyright_year(std::env::var(LAST_MODIFIED_VAR).ok().as_deref())?,
                project.author.name
            )),
            (None, None) => None,
        };

        // The feed lives under the output directory and the site root even
        // when written as an absolute path.
        let feed_path = match project.feed_path.strip_prefix("/") {
            Ok(relative) => relative.to_owned(),
            Err(_) => project.feed_path,
        };
        let site_root = with_trailing_slash(project.site_root);
        let feed_url = site_root.join(&feed_path.to_string_lossy())?;

        Ok(Config {
            title: project.title,
            author: project.author,
            subtitle: project.subtitle,
            copyright,
            language: project.language,
            time_zone,
            source_directory: project_root.join(project.source_directory),
            static_directory: project
                .static_directory
                .map(|relpath| project_root.join(relpath)),
            template: project.template.map(|relpath| project_root.join(relpath)),
            output_directory: output_directory.to_owned(),
            feed_file: output_directory.join(feed_path),
            feed_url,
            tags_page: project.tags_page,
            site_root,
            threads: match threads {
                None => num_cpus::get(),
                Some(threads) => threads,
            },
        })
    }
}

/// Picks the last year of the copyright range: the year of the
/// last-modified date when one is given (so rebuilding old sources is
/// reproducible), else the current year.
fn copyright_year(last_modified: Option<&str>) -> Result<i32> {
    use chrono::Datelike;
    match last_modified {
        Some(date) => {
            let year = date.get(..4).unwrap_or(date);
            match year.parse::<i32>() {
                Ok(year) if year.to_string().starts_with("20") => Ok(year),
                _ => Err(Error::LastModifiedDate(date.to_owned())),
            }
        }
        None => Ok(chrono::Local::now().year()),
    }
}

/// Represents the result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or any ancestor.
    NotFound(PathBuf),

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or is missing keys.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `time_zone` isn't a known zone name.
    TimeZone { name: String, err: String },

    /// Returned when the feed URL can't be built.
    UrlParse(url::ParseError),

    /// Returned when the last-modified date doesn't start with a year.
    LastModifiedDate(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(dir) => write!(
                f,
                "could not find `{}` in '{}' or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Open { path, err } => {
                write!(f, "opening project file '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => write!(f, "loading configuration: {}", err),
            Error::TimeZone { name, err } => {
                write!(f, "unknown time zone `{}`: {}", name, err)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::LastModifiedDate(date) => write!(
                f,
                "unable to parse year from {}=`{}`",
                LAST_MODIFIED_VAR, date
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { err, .. } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::NotFound(_) | Error::TimeZone { .. } | Error::LastModifiedDate(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const MINIMAL: &str = "site_root: https://example.org/blog\n\
title: Example Blog\n\
author:\n  name: Jo Example\n";

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::new(),
            err,
        })?;
        let path = dir.path().join(PROJECT_FILE);
        fs::write(&path, MINIMAL).map_err(|err| Error::Open {
            path: path.clone(),
            err,
        })?;

        let config = Config::from_project_file(&path, Path::new("/tmp/out"), Some(1))?;
        assert_eq!("https://example.org/blog/", config.site_root.as_str());
        assert_eq!("https://example.org/blog/atom.xml", config.feed_url.as_str());
        assert_eq!(PathBuf::from("/tmp/out/atom.xml"), config.feed_file);
        assert_eq!(dir.path().join("content"), config.source_directory);
        assert_eq!(chrono_tz::America::Vancouver, config.time_zone);
        assert_eq!("en", config.language);
        assert_eq!(None, config.tags_page);
        assert_eq!(None, config.copyright);
        assert_eq!(1, config.threads);
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::new(),
            err,
        })?;
        let nested = dir.path().join("content/2024");
        fs::create_dir_all(&nested).map_err(|err| Error::Open {
            path: nested.clone(),
            err,
        })?;
        fs::write(dir.path().join(PROJECT_FILE), MINIMAL).map_err(|err| Error::Open {
            path: dir.path().to_owned(),
            err,
        })?;

        let config = Config::from_directory(&nested, Path::new("out"), None)?;
        assert_eq!("Example Blog", config.title);
        assert!(config.threads >= 1);
        Ok(())
    }

    #[test]
    fn test_unknown_time_zone() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::new(),
            err,
        })?;
        let path = dir.path().join(PROJECT_FILE);
        fs::write(&path, format!("{}time_zone: Mars/Olympus\n", MINIMAL)).map_err(|err| {
            Error::Open {
                path: path.clone(),
                err,
            }
        })?;
        match Config::from_project_file(&path, Path::new("out"), Some(1)) {
            Err(Error::TimeZone { name, .. }) => assert_eq!("Mars/Olympus", name),
            other => panic!("wanted TimeZone; found {:?}", other.map(|c| c.title)),
        }
        Ok(())
    }

    fn project_file(dir: &Path, contents: &str) -> Result<PathBuf> {
        let path = dir.join(PROJECT_FILE);
        fs::write(&path, contents).map_err(|err| Error::Open {
            path: path.clone(),
            err,
        })?;
        Ok(path)
    }

    #[test]
    fn test_copyright_since_with_time_zone() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::new(),
            err,
        })?;
        let path = project_file(
            dir.path(),
            &format!("{}copyright_since: 2020\ntime_zone: Europe/Berlin\n", MINIMAL),
        )?;
        let config = Config::from_project_file(&path, Path::new("out"), Some(1))?;
        assert_eq!(chrono_tz::Europe::Berlin, config.time_zone);
        let copyright = config.copyright.unwrap_or_default();
        assert!(copyright.starts_with("2020-20"), "{}", copyright);
        assert!(copyright.ends_with(", Jo Example"), "{}", copyright);
        Ok(())
    }

    #[test]
    fn test_absolute_feed_path_stays_under_output() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|err| Error::Open {
            path: PathBuf::new(),
            err,
        })?;
        let path = project_file(dir.path(), &format!("{}feed_path: /feeds/atom.xml\n", MINIMAL))?;
        let config = Config::from_project_file(&path, Path::new("/tmp/out"), Some(1))?;
        assert_eq!(PathBuf::from("/tmp/out/feeds/atom.xml"), config.feed_file);
        assert_eq!(
            "https://example.org/blog/feeds/atom.xml",
            config.feed_url.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_copyright_year() -> Result<()> {
        assert_eq!(2026, copyright_year(Some("20260105123000"))?);
        assert!(matches!(
            copyright_year(Some("19990101")),
            Err(Error::LastModifiedDate(_))
        ));
        assert!(copyright_year(None)? >= 2024);
        Ok(())
    }
}
