use ego_tree::NodeRef;
use relay_core::{Element, MarkupNode};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Nesting depth past which a subtree is kept only as its text.
pub const MAX_MARKUP_DEPTH: usize = 256;

/// Copy a parsed element and its subtree into an owned markup tree.
/// Comments, doctypes and processing instructions are dropped. Elements
/// nested deeper than [`MAX_MARKUP_DEPTH`] keep their tag but hold a single
/// text child with their visible text, space-joined.
pub fn to_markup(element: ElementRef<'_>) -> Element {
    element_to_markup(element, 0)
}

fn element_to_markup(element: ElementRef<'_>, depth: usize) -> Element {
    let value = element.value();
    let mut out = Element::new(value.name());
    out.attributes = value
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    if depth >= MAX_MARKUP_DEPTH {
        let text = collapsed_text(element);
        if !text.is_empty() {
            out.children.push(MarkupNode::text(text));
        }
        return out;
    }
    out.children = element
        .children()
        .filter_map(|node| node_to_markup(node, depth + 1))
        .collect();
    out
}

fn node_to_markup(node: NodeRef<'_, Node>, depth: usize) -> Option<MarkupNode> {
    match node.value() {
        Node::Text(text) => Some(MarkupNode::text(&**text)),
        Node::Element(_) => {
            ElementRef::wrap(node).map(|element| element_to_markup(element, depth).into())
        }
        _ => None,
    }
}

// `ElementRef::text` walks the subtree without recursing.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Nearest element sibling before `element`, skipping text between them.
pub fn previous_element_sibling<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

/// Nearest element sibling after `element`, skipping text between them.
pub fn next_element_sibling<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// First element in document order whose `name` attribute equals `value`.
pub fn find_by_attr<'a>(doc: &'a Html, name: &str, value: &str) -> Option<ElementRef<'a>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().attr(name) == Some(value))
}

pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text of an element, whitespace-trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
