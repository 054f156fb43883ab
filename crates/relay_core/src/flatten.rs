use crate::markup::{Element, MarkupNode};
use crate::message::escape_html;

const BOLD: (&str, &str) = ("<b>", "</b>");
const ITALIC: (&str, &str) = ("<i>", "</i>");

/// Flatten a nested post body into a linear message body.
///
/// Children of a `span` are glued together, children of anything else are
/// joined with newlines. The group markup nests sibling lines inside wrapper
/// elements inconsistently, so this only approximates the visual line layout.
/// Flattening siblings instead of children may be closer for some posts; that
/// has not been checked against real pages.
pub fn flatten(node: Option<&MarkupNode>) -> String {
    match node {
        Some(node) => flatten_node(node, str::to_string),
        None => String::new(),
    }
}

/// Convenience for callers holding an element rather than a node.
pub fn flatten_element(element: &Element) -> String {
    flatten_element_with(element, str::to_string)
}

/// [`flatten_element`] with every text leaf escaped for an HTML-formatted
/// message. The bold and italic markers stay markup.
pub fn flatten_for_html(element: &Element) -> String {
    flatten_element_with(element, escape_html)
}

fn flatten_element_with(element: &Element, leaf: fn(&str) -> String) -> String {
    match element.tag.as_str() {
        // Links are leaves: only their visible text, never the href.
        "a" => element
            .stripped_strings()
            .into_iter()
            .map(leaf)
            .collect::<String>(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "b" => {
            wrap(BOLD, flatten_children(element, leaf))
        }
        "i" | "em" => wrap(ITALIC, flatten_children(element, leaf)),
        _ => flatten_children(element, leaf),
    }
}

fn flatten_node(node: &MarkupNode, leaf: fn(&str) -> String) -> String {
    match node {
        MarkupNode::Text(text) => leaf(text.trim()),
        MarkupNode::Element(element) => flatten_element_with(element, leaf),
    }
}

fn flatten_children(element: &Element, leaf: fn(&str) -> String) -> String {
    let parts: Vec<String> = element
        .children
        .iter()
        .map(|child| flatten_node(child, leaf))
        .filter(|part| !part.is_empty())
        .collect();
    let separator = if element.tag == "span" { "" } else { "\n" };
    parts.join(separator)
}

fn wrap((open, close): (&str, &str), inner: String) -> String {
    if inner.is_empty() {
        return inner;
    }
    format!("{open}{inner}{close}")
}
