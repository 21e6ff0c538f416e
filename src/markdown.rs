//! Converts a Markdown source into a [`Document`].
//!
//! Markdown is parsed by [`pulldown_cmark`] and rendered to HTML in chunks,
//! except for two kinds of block which become nodes of their own:
//!
//! * top-level headings, so that post titles and anchors are available to
//!   the build;
//! * fenced blocks whose info string names one of the blog directives, at
//!   any depth (inside list items and block quotes too), e.g.
//!
//! ````text
//! ```{blogpost} 2024-12-01
//! :tags: nixos, router
//! :category: hardware
//! ```
//!
//! ```{blogrecent}
//! ```
//! ````
//!
//! Directive bodies hold `:name: value` options and nothing else.

use crate::document::{Document, Node, Placeholder};
use crate::post::{split_list, PostDeclaration};
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag};
use std::fmt;

/// The directive that declares a document to be a post.
pub const POST_DIRECTIVE: &str = "blogpost";

const PLACEHOLDERS: [Placeholder; 3] = [
    Placeholder::Recent,
    Placeholder::Archive,
    Placeholder::Tags,
];

/// Parses `markdown` into a document identified by `id`.
pub fn to_document(id: &str, markdown: &str) -> Result<Document> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut nodes = Vec::new();
    let mut pending = Vec::new();
    let mut depth = 0usize;
    let mut events = Parser::new_ext(markdown, options);
    while let Some(event) = events.next() {
        match &event {
            Event::Start(Tag::Heading(level)) if depth == 0 => {
                flush(&mut nodes, &mut pending);
                let text = inner_text(&mut events);
                nodes.push(Node::Heading {
                    level: *level,
                    id: slug::slugify(&text),
                    text,
                });
                continue;
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                // A nested directive splits its enclosing element across two
                // HTML chunks; rendering concatenates them back together.
                if let Some((name, argument)) = directive(info) {
                    flush(&mut nodes, &mut pending);
                    let body = inner_text(&mut events);
                    nodes.push(directive_node(name, argument, &body)?);
                    continue;
                }
            }
            _ => {}
        }
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        pending.push(event);
    }
    flush(&mut nodes, &mut pending);

    Ok(Document::new(id, nodes))
}

/// Renders the buffered events as a single HTML node.
fn flush<'a>(nodes: &mut Vec<Node>, pending: &mut Vec<Event<'a>>) {
    if !pending.is_empty() {
        let mut out = String::new();
        html::push_html(&mut out, pending.drain(..));
        nodes.push(Node::Html(out));
    }
}

/// Consumes events up to the end of the element whose start was just read
/// and returns its text content.
fn inner_text<'a, I: Iterator<Item = Event<'a>>>(events: &mut I) -> String {
    let mut text = String::new();
    let mut depth = 0usize;
    for event in events {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim_end().to_owned()
}

/// Splits a fence info string like `{blogpost} 2024-12-01` into the
/// directive name and its argument. Returns `None` for anything that isn't a
/// blog directive, which leaves the block as an ordinary code block.
fn directive(info: &str) -> Option<(&str, Option<&str>)> {
    let rest = info.trim().strip_prefix('{')?;
    let close = rest.find('}')?;
    let name = rest[..close].trim();
    if name != POST_DIRECTIVE && !PLACEHOLDERS.iter().any(|p| p.directive() == name) {
        return None;
    }
    let argument = rest[close + 1..].trim();
    Some((name, if argument.is_empty() { None } else { Some(argument) }))
}

fn directive_node(name: &str, argument: Option<&str>, body: &str) -> Result<Node> {
    let options = parse_options(name, body)?;
    if name == POST_DIRECTIVE {
        let mut declaration = PostDeclaration {
            date: argument.map(str::to_owned),
            ..PostDeclaration::default()
        };
        for (option, value) in options {
            match option.as_str() {
                "tags" => declaration.tags = split_list(&value),
                "category" => declaration.category = split_list(&value),
                "title" => declaration.title = Some(value),
                "updated" => declaration.updated = Some(value),
                _ => {
                    return Err(Error::UnknownOption {
                        directive: name.to_owned(),
                        option,
                    })
                }
            }
        }
        return Ok(Node::Post(declaration));
    }

    // View directives take no options. An argument is tolerated and ignored.
    if let Some((option, _)) = options.into_iter().next() {
        return Err(Error::UnknownOption {
            directive: name.to_owned(),
            option,
        });
    }
    match PLACEHOLDERS.iter().find(|p| p.directive() == name) {
        Some(placeholder) => Ok(Node::Placeholder(*placeholder)),
        None => Err(Error::UnknownOption {
            directive: name.to_owned(),
            option: String::new(),
        }),
    }
}

/// Parses `:name: value` lines. Blank lines are skipped; values are trimmed.
fn parse_options(directive: &str, body: &str) -> Result<Vec<(String, String)>> {
    let mut options: Vec<(String, String)> = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (option, value) = line
            .strip_prefix(':')
            .and_then(|rest| rest.find(':').map(|end| (&rest[..end], &rest[end + 1..])))
            .ok_or_else(|| Error::StrayLine {
                directive: directive.to_owned(),
                line: line.to_owned(),
            })?;
        if options.iter().any(|(seen, _)| seen == option) {
            return Err(Error::DuplicateOption {
                directive: directive.to_owned(),
                option: option.to_owned(),
            });
        }
        options.push((option.to_owned(), value.trim().to_owned()));
    }
    Ok(options)
}

/// Represents the result of parsing a Markdown document.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed blog directive.
#[derive(Debug)]
pub enum Error {
    /// Returned when a directive body contains a line that isn't an option.
    StrayLine { directive: String, line: String },

    /// Returned when a directive is given an option it doesn't accept.
    UnknownOption { directive: String, option: String },

    /// Returned when a directive is given the same option twice.
    DuplicateOption { directive: String, option: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::StrayLine { directive, line } => write!(
                f,
                "`{}` directive: expected `:option: value`, found `{}`",
                directive, line
            ),
            Error::UnknownOption { directive, option } => {
                write!(f, "`{}` directive: unknown option `{}`", directive, option)
            }
            Error::DuplicateOption { directive, option } => {
                write!(f, "`{}` directive: duplicate option `{}`", directive, option)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    const POST: &str = "# Home server\n\n\
```{blogpost} 2024-12-01\n\
:tags: nixos, router\n\
:category: hardware\n\
```\n\n\
Some *text* here.\n\n\
## Parts\n";

    #[test]
    fn test_post_document() -> Result<()> {
        let doc = to_document("2024/12/home_server", POST)?;
        assert_eq!("2024/12/home_server", doc.id);
        assert_eq!(Some("Home server"), doc.first_heading());
        assert_eq!(
            Node::Post(PostDeclaration {
                date: Some("2024-12-01".to_owned()),
                tags: vec!["nixos".to_owned(), "router".to_owned()],
                category: vec!["hardware".to_owned()],
                title: None,
                updated: None,
            }),
            doc.nodes[1],
        );
        assert_eq!(
            Node::Html("<p>Some <em>text</em> here.</p>\n".to_owned()),
            doc.nodes[2],
        );
        assert_eq!(
            Node::Heading {
                level: 2,
                id: "parts".to_owned(),
                text: "Parts".to_owned(),
            },
            doc.nodes[3],
        );
        Ok(())
    }

    #[test]
    fn test_placeholders() -> Result<()> {
        let doc = to_document(
            "index",
            "# Blog\n\n```{blogrecent}\n```\n\n```{blogarchive}\n```\n\n```{blogtags}\n```\n",
        )?;
        let placeholders: Vec<&Node> = doc
            .nodes
            .iter()
            .filter(|n| matches!(n, Node::Placeholder(_)))
            .collect();
        assert_eq!(
            vec![
                &Node::Placeholder(Placeholder::Recent),
                &Node::Placeholder(Placeholder::Archive),
                &Node::Placeholder(Placeholder::Tags),
            ],
            placeholders,
        );
        Ok(())
    }

    #[test]
    fn test_title_and_updated_options() -> Result<()> {
        let doc = to_document(
            "post",
            "```{blogpost} 2025-01-10\n:title: Override\n:updated: 2025-03-01\n:tags:\n```\n",
        )?;
        match &doc.nodes[0] {
            Node::Post(decl) => {
                assert_eq!(Some("Override"), decl.title.as_deref());
                assert_eq!(Some("2025-03-01"), decl.updated.as_deref());
                assert!(decl.tags.is_empty());
            }
            other => panic!("wanted a post declaration; found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_other_fences_stay_code() -> Result<()> {
        let doc = to_document("post", "```{note} hi\ntext\n```\n")?;
        assert_eq!(1, doc.nodes.len());
        assert!(matches!(&doc.nodes[0], Node::Html(html) if html.starts_with("<pre>")));
        Ok(())
    }

    #[test]
    fn test_nested_heading_stays_html() -> Result<()> {
        let doc = to_document("post", "> # Quoted\n")?;
        assert_eq!(None, doc.first_heading());
        Ok(())
    }

    #[test]
    fn test_unknown_option() {
        match to_document("post", "```{blogpost} 2025-01-10\n:author: me\n```\n") {
            Err(Error::UnknownOption { option, .. }) => assert_eq!("author", option),
            other => panic!("wanted UnknownOption; found {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_rejects_options() {
        let result = to_document("index", "```{blogrecent}\n:limit: 5\n```\n");
        assert!(matches!(result, Err(Error::UnknownOption { .. })));
    }

    #[test]
    fn test_stray_line() {
        let result = to_document("post", "```{blogpost} 2025-01-10\nhello\n```\n");
        assert!(matches!(result, Err(Error::StrayLine { .. })));
    }

    #[test]
    fn test_duplicate_option() {
        let result = to_document("post", "```{blogpost} 2025-01-10\n:tags: a\n:tags: b\n```\n");
        assert!(matches!(result, Err(Error::DuplicateOption { .. })));
    }

    #[test]
    fn test_placeholder_in_block_quote() -> Result<()> {
        let doc = to_document("index", "# Blog\n\n> Latest:\n>\n> ```{blogrecent}\n> ```\n")?;
        assert!(doc.requests(Placeholder::Recent));
        let html: String = doc
            .nodes
            .iter()
            .filter_map(|node| match node {
                Node::Html(html) => Some(html.as_str()),
                _ => None,
            })
            .collect();
        assert!(html.starts_with("<blockquote>"), "{}", html);
        assert!(html.trim_end().ends_with("</blockquote>"), "{}", html);
        assert!(!html.contains("language-{blogrecent}"), "{}", html);
        Ok(())
    }

    #[test]
    fn test_post_in_list_item() -> Result<()> {
        let doc = to_document("p", "# T\n\n- item\n\n  ```{blogpost} 2025-13-40\n  ```\n")?;
        let posts: Vec<&Node> = doc
            .descendants()
            .into_iter()
            .filter(|n| matches!(n, Node::Post(_)))
            .collect();
        assert_eq!(
            vec![&Node::Post(PostDeclaration {
                date: Some("2025-13-40".to_owned()),
                ..PostDeclaration::default()
            })],
            posts
        );
        Ok(())
    }
}
