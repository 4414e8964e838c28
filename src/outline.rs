use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while building an outline tree.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OutlineError {
    /// A node was requested with a title that is empty after trimming.
    #[error("node {0} must have a non-empty title")]
    EmptyTitle(NodeId),
}

/// Identifier of a node within one conversion run.
///
/// Rendered as `topic<N>` with no zero-padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic{}", self.0)
    }
}

/// Hands out strictly increasing node ids, starting at 1.
///
/// A counter belongs to a single parse; two conversions never share one.
#[derive(Debug, Default)]
pub struct IdCounter {
    last: u32,
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id.
    pub fn next(&mut self) -> NodeId {
        self.last += 1;
        NodeId(self.last)
    }
}

/// Escapes the five XML-reserved characters.
///
/// `&` is replaced first so entities produced by the later substitutions
/// are never escaped twice.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// A single topic of the mind map.
///
/// The title is stored markup-escaped, ready to be written into XML as is.
/// A node owns its children; there are no parent links.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Node {
    id: NodeId,
    title: String,
    children: Vec<Node>,
}

impl Node {
    /// Creates a leaf node.
    ///
    /// # Arguments
    ///
    /// * `id` - The id rendered as `topic<N>`.
    /// * `title` - The already escaped title text.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError::EmptyTitle` if `title` is empty.
    pub fn new(id: NodeId, title: impl Into<String>) -> Result<Self, OutlineError> {
        let title = title.into();
        if title.is_empty() {
            return Err(OutlineError::EmptyTitle(id));
        }
        Ok(Node {
            id,
            title,
            children: Vec::new(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The escaped title text.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child and returns a mutable reference to it.
    pub fn add_child(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns an iterator over all descendant nodes in pre-order (children left-to-right).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Number of topics in this subtree, this node included.
    pub fn topic_count(&self) -> usize {
        1 + self.descendants().count()
    }
}

/// An iterator over the descendants of a `Node`.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let next_node = self.stack.pop()?;

        // Push in reverse so the leftmost child is visited first
        self.stack.extend(next_node.children.iter().rev());

        Some(next_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(1).to_string(), "topic1");
        assert_eq!(NodeId(42).to_string(), "topic42");
    }

    #[test]
    fn test_id_counter_starts_at_one() {
        let mut counter = IdCounter::new();
        assert_eq!(counter.next(), NodeId(1));
        assert_eq!(counter.next(), NodeId(2));
        assert_eq!(counter.next(), NodeId(3));
    }

    #[test]
    fn test_id_counters_are_independent() {
        let mut a = IdCounter::new();
        let mut b = IdCounter::new();
        a.next();
        a.next();
        assert_eq!(b.next(), NodeId(1));
        assert_eq!(a.next(), NodeId(3));
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("plain"), "plain");
        assert_eq!(
            escape_markup(r#"&<>"'"#),
            "&amp;&lt;&gt;&quot;&apos;"
        );
        // entity-looking text is escaped once, not interpreted
        assert_eq!(escape_markup("&amp;"), "&amp;amp;");
        assert_eq!(escape_markup("a < b && c"), "a &lt; b &amp;&amp; c");
    }

    #[test]
    fn test_node_new_rejects_empty_title() {
        assert_eq!(
            Node::new(NodeId(7), ""),
            Err(OutlineError::EmptyTitle(NodeId(7)))
        );
        assert_eq!(
            OutlineError::EmptyTitle(NodeId(7)).to_string(),
            "node topic7 must have a non-empty title"
        );
    }

    #[test]
    fn test_node_add_child() {
        let mut root = Node::new(NodeId(1), "root").unwrap();
        assert!(root.is_leaf());

        let child = root.add_child(Node::new(NodeId(2), "child").unwrap());
        child.add_child(Node::new(NodeId(3), "grandchild").unwrap());

        assert!(!root.is_leaf());
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].title(), "child");
        assert_eq!(root.children()[0].children()[0].id(), NodeId(3));
        assert!(root.children()[0].children()[0].is_leaf());
    }

    #[test]
    fn test_descendants_pre_order() {
        // root -> A -> (B -> C), A -> D; root -> E
        let mut root = Node::new(NodeId(1), "root").unwrap();
        let a = root.add_child(Node::new(NodeId(2), "A").unwrap());
        let b = a.add_child(Node::new(NodeId(3), "B").unwrap());
        b.add_child(Node::new(NodeId(4), "C").unwrap());
        a.add_child(Node::new(NodeId(5), "D").unwrap());
        root.add_child(Node::new(NodeId(6), "E").unwrap());

        let titles: Vec<_> = root.descendants().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(root.topic_count(), 6);
        assert_eq!(root.children()[0].topic_count(), 4);
    }
}
