//! Defines the [`Document`] tree shared by every build pass. The corpus loader
//! ([`crate::markdown`]) produces documents whose directive blocks are marker
//! nodes ([`Node::Post`] and [`Node::Placeholder`]). The discovery pass
//! ([`crate::index`]) and the resolve pass ([`crate::views`]) swap those
//! markers for concrete nodes with [`Document::replace`], and the page writer
//! ([`crate::write`]) renders whatever remains.

use crate::post::PostDeclaration;

/// Identifies a document within a build: the source path relative to the
/// source directory, less the extension, with `/` separators (e.g.
/// `2024/12/router`).
pub type DocId = String;

/// One source document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The document's identifier.
    pub id: DocId,

    /// The document's top-level nodes, in source order.
    pub nodes: Vec<Node>,

    /// Orphan documents are left out of the site navigation. Posts are
    /// orphans; readers find them through the generated views instead.
    pub orphan: bool,
}

/// The generated views a document can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    /// The `blogrecent` directive.
    Recent,

    /// The `blogarchive` directive.
    Archive,

    /// The `blogtags` directive.
    Tags,
}

impl Placeholder {
    /// The directive name that produces this placeholder.
    pub fn directive(self) -> &'static str {
        match self {
            Placeholder::Recent => "blogrecent",
            Placeholder::Archive => "blogarchive",
            Placeholder::Tags => "blogtags",
        }
    }
}

/// Inline content of a [`Node::Paragraph`].
#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    Reference { uri: String, text: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A heading. `id` is the slugified text and doubles as the anchor.
    Heading { level: u32, id: String, text: String },

    /// Markdown that was rendered straight to HTML by the loader.
    Html(String),

    Paragraph(Vec<Inline>),

    /// A bulleted list; each item is a sequence of nodes.
    BulletList(Vec<Vec<Node>>),

    Section {
        id: String,
        title: String,
        children: Vec<Node>,
    },

    Container { class: String, children: Vec<Node> },

    /// A horizontal rule.
    Transition,

    /// Marker for a post declaration. Replaced during discovery.
    Post(PostDeclaration),

    /// Marker for a generated view. Replaced during the resolve pass.
    Placeholder(Placeholder),
}

impl Document {
    pub fn new<S: Into<DocId>>(id: S, nodes: Vec<Node>) -> Document {
        Document {
            id: id.into(),
            nodes,
            orphan: false,
        }
    }

    /// Returns every node in the document in pre-order.
    pub fn descendants(&self) -> Vec<&Node> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                out.push(node);
                match node {
                    Node::Section { children, .. }
                    | Node::Container { children, .. } => walk(children, out),
                    Node::BulletList(items) => {
                        for item in items {
                            walk(item, out);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// Returns the text of the document's first heading, whatever its
    /// level. This is the document's title.
    pub fn first_heading(&self) -> Option<&str> {
        self.descendants().into_iter().find_map(|node| match node {
            Node::Heading { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Returns true if any node in the document is a view placeholder.
    pub fn has_placeholders(&self) -> bool {
        self.descendants()
            .into_iter()
            .any(|node| matches!(node, Node::Placeholder(_)))
    }

    /// Returns true if the document asks for the given view.
    pub fn requests(&self, placeholder: Placeholder) -> bool {
        self.descendants()
            .into_iter()
            .any(|node| *node == Node::Placeholder(placeholder))
    }

    /// Walks the document and replaces every node for which `f` returns
    /// `Some`. Replacement nodes are not walked again. Returns the number of
    /// replaced nodes. The first error from `f` aborts the walk.
    pub fn replace<F, E>(&mut self, mut f: F) -> Result<usize, E>
    where
        F: FnMut(&Node) -> Result<Option<Node>, E>,
    {
        let mut replaced = 0;
        replace_in(&mut self.nodes, &mut f, &mut replaced)?;
        Ok(replaced)
    }
}

fn replace_in<F, E>(nodes: &mut [Node], f: &mut F, replaced: &mut usize) -> Result<(), E>
where
    F: FnMut(&Node) -> Result<Option<Node>, E>,
{
    for node in nodes.iter_mut() {
        if let Some(replacement) = f(node)? {
            *node = replacement;
            *replaced += 1;
            continue;
        }
        match node {
            Node::Section { children, .. } | Node::Container { children, .. } => {
                replace_in(children, f, replaced)?
            }
            Node::BulletList(items) => {
                for item in items.iter_mut() {
                    replace_in(item, f, replaced)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
