//! Renders [`Node`]s into HTML. Markdown content arrives pre-rendered as
//! [`Node::Html`]; this module only has to render the nodes the build passes
//! generate.

use crate::document::{Inline, Node};
use pulldown_cmark::escape::{escape_href, escape_html};
use std::io;

/// Renders a sequence of nodes. Marker nodes render as nothing; the build
/// replaces them before pages are written.
pub fn render(nodes: &[Node]) -> io::Result<String> {
    let mut out = String::new();
    for node in nodes {
        render_node(&mut out, node)?;
    }
    Ok(out)
}

fn render_node(w: &mut String, node: &Node) -> io::Result<()> {
    match node {
        Node::Heading { level, id, text } => {
            w.push_str(&format!("<h{} id=\"", level));
            escape_html(&mut *w, id)?;
            w.push_str("\">");
            escape_html(&mut *w, text)?;
            w.push_str(&format!("</h{}>\n", level));
        }
        Node::Html(html) => w.push_str(html),
        Node::Paragraph(inlines) => {
            w.push_str("<p>");
            for inline in inlines {
                render_inline(w, inline)?;
            }
            w.push_str("</p>\n");
        }
        Node::BulletList(items) => {
            w.push_str("<ul>\n");
            for item in items {
                w.push_str("<li>");
                for child in item {
                    render_node(w, child)?;
                }
                w.push_str("</li>\n");
            }
            w.push_str("</ul>\n");
        }
        Node::Section {
            id,
            title,
            children,
        } => {
            w.push_str("<section id=\"");
            escape_html(&mut *w, id)?;
            w.push_str("\">\n<h2>");
            escape_html(&mut *w, title)?;
            w.push_str("</h2>\n");
            for child in children {
                render_node(w, child)?;
            }
            w.push_str("</section>\n");
        }
        Node::Container { class, children } => {
            w.push_str("<div class=\"");
            escape_html(&mut *w, class)?;
            w.push_str("\">\n");
            for child in children {
                render_node(w, child)?;
            }
            w.push_str("</div>\n");
        }
        Node::Transition => w.push_str("<hr />\n"),
        Node::Post(_) | Node::Placeholder(_) => {}
    }
    Ok(())
}

fn render_inline(w: &mut String, inline: &Inline) -> io::Result<()> {
    match inline {
        Inline::Text(text) => escape_html(&mut *w, text),
        Inline::Reference { uri, text } => {
            w.push_str("<a class=\"reference\" href=\"");
            escape_href(&mut *w, uri)?;
            w.push_str("\">");
            escape_html(&mut *w, text)?;
            w.push_str("</a>");
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render_reference_escapes() -> io::Result<()> {
        let html = render(&[Node::Paragraph(vec![
            Inline::Text("2025-01-10 ".to_owned()),
            Inline::Reference {
                uri: "a&b.html".to_owned(),
                text: "Fish & <Chips>".to_owned(),
            },
        ])])?;
        assert_eq!(
            "<p>2025-01-10 <a class=\"reference\" href=\"a&amp;b.html\">Fish &amp; &lt;Chips&gt;</a></p>\n",
            html
        );
        Ok(())
    }

    #[test]
    fn test_render_section_list() -> io::Result<()> {
        let html = render(&[Node::Section {
            id: "year-2025".to_owned(),
            title: "2025".to_owned(),
            children: vec![Node::BulletList(vec![vec![Node::Html("x".to_owned())]])],
        }])?;
        assert_eq!(
            "<section id=\"year-2025\">\n<h2>2025</h2>\n<ul>\n<li>x</li>\n</ul>\n</section>\n",
            html
        );
        Ok(())
    }

    #[test]
    fn test_markers_render_empty() -> io::Result<()> {
        use crate::document::Placeholder;
        assert_eq!("", render(&[Node::Placeholder(Placeholder::Tags)])?);
        Ok(())
    }
}
