//! Support for creating an Atom feed from the [`PostIndex`].

use crate::config::Author;
use crate::index::PostIndex;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::io::Write;
use url::Url;

type FixedDateTime = DateTime<FixedOffset>;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,

    /// The feed's id; the site's base URL.
    pub id: String,

    pub author: Author,
    pub subtitle: Option<String>,
    pub copyright: Option<String>,
    pub language: String,

    /// The site the feed describes (the `alternate` link).
    pub home_page: Url,

    /// Where the feed itself is published (the `self` link).
    pub feed_url: Url,

    /// Post dates are anchored at midnight in this zone.
    pub time_zone: Tz,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and the
/// [`PostIndex`] and writes the result to a [`std::io::Write`]. The whole
/// feed is built before anything is written.
pub fn write_feed<W: Write>(config: FeedConfig, index: &PostIndex, w: W) -> Result<()> {
    feed(config, index)?.write_to(w)?;
    Ok(())
}

/// Builds the feed. Entries are oldest first. The feed's `updated` is the
/// latest published or updated timestamp among the entries, tracked while
/// the entries are built; an empty feed uses the Unix epoch.
pub fn feed(config: FeedConfig, index: &PostIndex) -> Result<Feed> {
    let mut entries = Vec::with_capacity(index.len());
    let mut newest: Option<FixedDateTime> = None;

    for post in index.oldest_first() {
        let published = anchor(config.time_zone, post.published)?;
        let updated = match post.updated {
            Some(updated) => anchor(config.time_zone, updated)?,
            None => published,
        };
        for timestamp in [published, updated].iter() {
            if newest.map_or(true, |newest| *timestamp > newest) {
                newest = Some(*timestamp);
            }
        }

        let mut entry = Entry::default();
        entry.set_id(post.url.to_string());
        entry.set_title(post.title.as_str());
        entry.set_links(vec![link(post.url.as_str(), "alternate")]);
        entry.set_published(Some(published));
        entry.set_updated(updated);
        entries.push(entry);
    }

    let mut feed = Feed::default();
    feed.set_id(config.id);
    feed.set_title(config.title);
    feed.set_authors(vec![person(config.author)]);
    feed.set_subtitle(config.subtitle.map(Text::plain));
    feed.set_rights(config.copyright.map(Text::plain));
    feed.set_lang(Some(config.language));
    feed.set_links(vec![
        link(config.home_page.as_str(), "alternate"),
        link(config.feed_url.as_str(), "self"),
    ]);
    feed.set_updated(newest.unwrap_or_else(epoch));
    feed.set_entries(entries);
    Ok(feed)
}

/// Anchors a calendar date at local midnight in `time_zone`.
fn anchor(time_zone: Tz, date: NaiveDate) -> Result<FixedDateTime> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(Error::NonexistentLocalTime(date))?;
    match time_zone.from_local_datetime(&midnight).earliest() {
        Some(local) => Ok(local.fixed_offset()),
        None => Err(Error::NonexistentLocalTime(date)),
    }
}

fn epoch() -> FixedDateTime {
    Utc.from_utc_datetime(&NaiveDateTime::default()).fixed_offset()
}

fn link(href: &str, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}

fn person(author: Author) -> Person {
    let mut person = Person::default();
    person.set_name(author.name);
    person.set_email(author.email);
    person
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include I/O, Atom, and
/// time-zone issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),

    /// Returned when midnight doesn't exist on a post's date in the
    /// configured zone.
    NonexistentLocalTime(NaiveDate),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
            Error::NonexistentLocalTime(date) => {
                write!(f, "midnight on {} does not exist in the feed's time zone", date)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
            Error::NonexistentLocalTime(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::PostEntry;

    fn entry(id: &str, date: &str, updated: Option<&str>) -> PostEntry {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        PostEntry {
            document_id: id.to_owned(),
            title: format!("Title of {}", id),
            tags: Vec::new(),
            category: Vec::new(),
            published: parse(date),
            updated: updated.map(parse),
            url: Url::parse(&format!("https://example.org/{}.html", id)).unwrap(),
        }
    }

    fn config() -> FeedConfig {
        FeedConfig {
            title: "Example Blog".to_owned(),
            id: "https://example.org/".to_owned(),
            author: Author {
                name: "Jo Example".to_owned(),
                email: None,
            },
            subtitle: Some("Notes".to_owned()),
            copyright: Some("2024-2026, Jo Example".to_owned()),
            language: "en".to_owned(),
            home_page: Url::parse("https://example.org/").unwrap(),
            feed_url: Url::parse("https://example.org/atom.xml").unwrap(),
            time_zone: chrono_tz::America::Vancouver,
        }
    }

    fn index(entries: Vec<PostEntry>) -> PostIndex {
        let mut index = PostIndex::new();
        for e in entries {
            index.insert(e);
        }
        index
    }

    #[test]
    fn test_entries_oldest_first() -> Result<()> {
        let feed = feed(
            config(),
            &index(vec![
                entry("jan-a", "2025-01-10", None),
                entry("jan-b", "2025-01-10", None),
                entry("dec", "2024-12-01", None),
            ]),
        )?;
        let ids: Vec<&str> = feed.entries().iter().map(|e| e.id()).collect();
        assert_eq!(
            vec![
                "https://example.org/dec.html",
                "https://example.org/jan-a.html",
                "https://example.org/jan-b.html",
            ],
            ids
        );
        Ok(())
    }

    #[test]
    fn test_dates_anchored_in_zone() -> Result<()> {
        let feed = feed(
            config(),
            &index(vec![
                entry("winter", "2025-01-10", Some("2025-03-01")),
                entry("summer", "2025-07-01", None),
            ]),
        )?;
        let winter = &feed.entries()[0];
        assert_eq!(
            Some("2025-01-10T00:00:00-08:00".to_owned()),
            winter.published().map(|d| d.to_rfc3339())
        );
        assert_eq!("2025-03-01T00:00:00-08:00", winter.updated().to_rfc3339());

        let summer = &feed.entries()[1];
        assert_eq!("2025-07-01T00:00:00-07:00", summer.updated().to_rfc3339());
        assert_eq!(Some(summer.updated()), summer.published());
        Ok(())
    }

    #[test]
    fn test_feed_updated_is_newest_timestamp() -> Result<()> {
        let feed = feed(
            config(),
            &index(vec![
                entry("old", "2024-06-01", Some("2025-09-01")),
                entry("new", "2025-01-10", None),
            ]),
        )?;
        assert_eq!("2025-09-01T00:00:00-07:00", feed.updated().to_rfc3339());
        Ok(())
    }

    #[test]
    fn test_empty_feed() -> Result<()> {
        let feed = feed(config(), &PostIndex::new())?;
        assert!(feed.entries().is_empty());
        assert_eq!(epoch(), *feed.updated());
        Ok(())
    }

    #[test]
    fn test_feed_metadata() -> Result<()> {
        let mut out = Vec::new();
        write_feed(config(), &index(vec![entry("a", "2025-01-10", None)]), &mut out)?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<id>https://example.org/</id>"), "{}", xml);
        assert!(xml.contains("xml:lang=\"en\""), "{}", xml);
        assert!(xml.contains("rel=\"self\""), "{}", xml);
        assert!(xml.contains("https://example.org/atom.xml"), "{}", xml);
        assert!(xml.contains("2024-2026, Jo Example"), "{}", xml);
        assert!(xml.contains("<name>Jo Example</name>"), "{}", xml);
        Ok(())
    }
}
