//! Small `roxmltree` helpers shared by the container, package and TOC parsers.
//!
//! Element lookups match on the local name only, so `dc:title` and
//! `opf:title` both answer to `"title"`.

use roxmltree::{Document, Node, ParsingOptions};

/// Parse an XML document, tolerating a DOCTYPE declaration.
pub fn parse(text: &str) -> Result<Document<'_>, roxmltree::Error> {
    Document::parse_with_options(
        text,
        ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        },
    )
}

/// First direct child element named `name`.
pub fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// All direct child elements named `name`, in document order.
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Concatenated text of every descendant text node.
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Text content with whitespace runs collapsed and ends trimmed;
/// `None` when nothing is left.
pub fn trimmed_text(node: Node<'_, '_>) -> Option<String> {
    let text = text_content(node)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_matches_local_name() {
        let doc = parse(
            r#"<metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>A</dc:title></metadata>"#,
        )
        .unwrap();
        let title = child(doc.root_element(), "title").unwrap();
        assert_eq!(text_content(title), "A");
    }

    #[test]
    fn trimmed_text_collapses_whitespace() {
        let doc = parse("<t>\n  Moby\n   Dick  </t>").unwrap();
        assert_eq!(trimmed_text(doc.root_element()).as_deref(), Some("Moby Dick"));
        let empty = parse("<t>   </t>").unwrap();
        assert_eq!(trimmed_text(empty.root_element()), None);
    }

    #[test]
    fn doctype_is_accepted() {
        let doc = parse(
            "<?xml version=\"1.0\"?><!DOCTYPE ncx PUBLIC \"-//NISO//DTD ncx 2005-1//EN\" \"http://www.daisy.org/z3986/2005/ncx-2005-1.dtd\"><ncx/>",
        );
        assert!(doc.is_ok());
    }

    #[test]
    fn children_preserve_order() {
        let doc = parse("<s><i n='1'/><x/><i n='2'/></s>").unwrap();
        let ns: Vec<_> = children(doc.root_element(), "i")
            .filter_map(|n| n.attribute("n"))
            .collect();
        assert_eq!(ns, vec!["1", "2"]);
    }
}
