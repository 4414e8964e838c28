use crate::outline::{escape_markup, IdCounter, Node, OutlineError};
use log::debug;

/// Title given to the synthetic root topic when none is configured.
pub const DEFAULT_ROOT_TITLE: &str = "测试用例";

const INDENT: char = '\t';

/// Options for configuring the `OutlineParser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineParserOptions {
    /// Title of the root topic that represents the whole document.
    pub root_title: String,
}

impl Default for OutlineParserOptions {
    fn default() -> Self {
        OutlineParserOptions {
            root_title: DEFAULT_ROOT_TITLE.to_string(),
        }
    }
}

/// A parser for tab-indented outlines.
///
/// Every non-blank line becomes one node. A line's depth is the number of
/// leading tab characters; the node is attached to the closest ancestor
/// still open at a shallower depth, so a jump of several levels never
/// creates intermediate nodes.
pub struct OutlineParser {
    option: OutlineParserOptions,
}

impl OutlineParser {
    /// Creates a new `OutlineParser` with the given options.
    ///
    /// # Arguments
    ///
    /// * `option` - The `OutlineParserOptions` to configure the parser.
    pub fn new(option: OutlineParserOptions) -> Self {
        OutlineParser { option }
    }

    /// Parses the input text into a tree rooted at a synthetic root node.
    ///
    /// Ids are assigned from a counter local to this call: the root gets
    /// `topic1` and the lines follow in input order.
    ///
    /// # Arguments
    ///
    /// * `input` - The tab-indented outline text.
    ///
    /// # Returns
    ///
    /// The root `Node` holding every non-blank line as a descendant, or
    /// `OutlineError::EmptyTitle` when the configured root title is empty.
    pub fn parse(&self, input: &str) -> Result<Node, OutlineError> {
        let mut ids = IdCounter::new();
        let mut root = Node::new(ids.next(), escape_markup(self.option.root_title.trim()))?;

        // Open descendants of the root; the top of the stack sits at depth `stack.len()`.
        let mut stack: Vec<Node> = Vec::new();

        for line in input.lines() {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let indent_level = indent_level(line);
            while stack.len() > indent_level {
                close_top(&mut root, &mut stack);
            }

            stack.push(Node::new(ids.next(), escape_markup(text))?);
        }

        while !stack.is_empty() {
            close_top(&mut root, &mut stack);
        }

        debug!("parsed outline with {} topics", root.topic_count());
        Ok(root)
    }
}

/// Counts the leading tab characters of a line.
fn indent_level(line: &str) -> usize {
    line.chars().take_while(|&c| c == INDENT).count()
}

/// Pops the deepest open node and attaches it to its parent.
fn close_top(root: &mut Node, stack: &mut Vec<Node>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.add_child(done),
            None => root.add_child(done),
        };
    }
}
