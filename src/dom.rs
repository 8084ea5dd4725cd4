//! In-memory element tree produced by the parser.
//!
//! Only structure is modelled: names, attributes in document order, children and the
//! last trimmed text run of each element. Namespaces are not resolved; names are the
//! local part of the qualified name.

/// One element of a parsed document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Local element name
    pub name: String,
    /// Attributes in document order, duplicates kept
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<Node>,
    /// Trimmed character content of the last text run directly inside this element
    pub text: Option<String>,
}

impl Node {
    /// Create a new element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute append
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Get the first attribute value with the given name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First element named `name` in pre-order, starting with `self`
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Owned variant of [`Node::find`]; the rest of the tree is dropped.
    pub fn into_first(self, name: &str) -> Option<Node> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .into_iter()
            .find_map(|child| child.into_first(name))
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Root element, `None` when the input had no start tag
    pub root: Option<Node>,
    /// Processing instructions (including the XML declaration), rendered as `<?...?>`
    pub processing_instructions: Vec<String>,
    /// Directives such as `<!DOCTYPE ...>`
    pub directives: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Consume the document and pick the logical root.
    ///
    /// Without a filter this is the document root; with one it is the first element
    /// with that name found depth-first from the root.
    pub fn into_logical_root(self, root_tag: Option<&str>) -> Option<Node> {
        let root = self.root?;
        match root_tag {
            Some(tag) => root.into_first(tag),
            None => Some(root),
        }
    }
}
