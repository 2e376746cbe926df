//! HTML Serialization (innerHTML/outerHTML)
//!
//! Output is a pure function of the tree: identical trees serialize to
//! identical bytes, which is what audit snapshots compare.

use lumen_dom::{DomTree, NodeData, NodeId};

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "xmp", "iframe"];

/// HTML serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node: NodeId) -> String {
        let mut output = String::new();
        self.write_children(tree, node, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node: NodeId) -> String {
        let mut output = String::new();
        self.write_node(tree, node, &mut output);
        output
    }

    fn write_node(&self, tree: &DomTree, id: NodeId, output: &mut String) {
        let Some(node) = tree.get(id) else {
            return;
        };

        match &node.data {
            NodeData::Document => self.write_children(tree, id, output),
            NodeData::Element(elem) => {
                let tag = elem.name.as_str();
                output.push('<');
                output.push_str(tag);
                for attr in &elem.attrs {
                    output.push(' ');
                    output.push_str(&attr.name);
                    output.push_str("=\"");
                    escape_attribute(&attr.value, output);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    for (_, child) in tree.children(id) {
                        if let Some(text) = child.as_text() {
                            output.push_str(text);
                        }
                    }
                } else {
                    self.write_children(tree, id, output);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(text, output),
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    fn write_children(&self, tree: &DomTree, parent: NodeId, output: &mut String) {
        for (child, _) in tree.children(parent) {
            self.write_node(tree, child, output);
        }
    }
}

/// Escape text content for HTML
pub fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
pub fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        let mut output = String::new();
        escape_text("Fish & <chips>", &mut output);
        assert_eq!(output, "Fish &amp; &lt;chips&gt;");
    }

    #[test]
    fn test_escape_attribute_keeps_angle_brackets() {
        let mut output = String::new();
        escape_attribute("say \"hi\" <b>", &mut output);
        assert_eq!(output, "say &quot;hi&quot; <b>");
    }

    #[test]
    fn test_void_and_raw_elements() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let img = tree.create_element("img");
        let style = tree.create_element("style");
        let css = tree.create_text("a > b { color: red }");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, img).unwrap();
        tree.append_child(div, style).unwrap();
        tree.append_child(style, css).unwrap();
        tree.set_attribute(img, "alt", "").unwrap();

        assert_eq!(
            HtmlSerializer::new().serialize_outer(&tree, div),
            "<div><img alt=\"\"><style>a > b { color: red }</style></div>"
        );
        assert_eq!(
            HtmlSerializer::new().serialize_inner(&tree, div),
            "<img alt=\"\"><style>a > b { color: red }</style>"
        );
    }
}
