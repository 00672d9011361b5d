//! Canonical path addressing inside a document tree.
//!
//! Paths are interned through a build-scoped [`PathInterner`] so that equal paths are the
//! same [`PathId`] and can key maps without string comparisons. Identity is structural:
//! a path is its parent plus one segment, so a root key `a.b` and the key `b` nested
//! under `a` are different paths even though both render as `a.b`.
//!
//! The canonical text form joins field segments with `.` and writes array positions as
//! `[i]`, e.g. `friends[1].name`; the root is the empty string.

use std::collections::HashMap;

use lasso::{Rodeo, Spur};

/// Interned canonical path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId(u32);

impl PathId {
    const ROOT: PathId = PathId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Segment {
    Root,
    Field(Spur),
    Index(usize),
}

#[derive(Debug, Clone)]
struct PathNode {
    parent: Option<PathId>,
    segment: Segment,
    text: String,
}

/// Path interner owned by a single inference run.
pub struct PathInterner {
    names: Rodeo,
    nodes: Vec<PathNode>,
    children: HashMap<(PathId, Segment), PathId>,
    stripped: HashMap<PathId, PathId>,
}

impl PathInterner {
    /// Create an interner holding only the root path
    pub fn new() -> Self {
        let mut stripped = HashMap::new();
        stripped.insert(PathId::ROOT, PathId::ROOT);
        Self {
            names: Rodeo::default(),
            nodes: vec![PathNode {
                parent: None,
                segment: Segment::Root,
                text: String::new(),
            }],
            children: HashMap::new(),
            stripped,
        }
    }

    /// The root path
    pub fn root(&self) -> PathId {
        PathId::ROOT
    }

    /// Whether `path` is the root path
    pub fn is_root(&self, path: PathId) -> bool {
        path == PathId::ROOT
    }

    /// Append a field segment
    pub fn field(&mut self, parent: PathId, name: &str) -> PathId {
        let name = self.names.get_or_intern(name);
        self.child(parent, Segment::Field(name))
    }

    /// Append an array index to the current path
    pub fn index(&mut self, parent: PathId, index: usize) -> PathId {
        self.child(parent, Segment::Index(index))
    }

    /// Index-stripped projection: all elements of an array collapse to one path.
    pub fn strip_indices(&mut self, path: PathId) -> PathId {
        if let Some(stripped) = self.stripped.get(&path) {
            return *stripped;
        }
        let node = self.node(path);
        let stripped = match (node.parent, node.segment) {
            (Some(parent), Segment::Field(name)) => {
                let parent = self.strip_indices(parent);
                self.child(parent, Segment::Field(name))
            }
            (Some(parent), Segment::Index(_)) => self.strip_indices(parent),
            _ => PathId::ROOT,
        };
        self.stripped.insert(path, stripped);
        stripped
    }

    /// Canonical text of a path
    pub fn resolve(&self, path: PathId) -> &str {
        &self.node(path).text
    }

    /// Canonical text for messages, with the root spelled out
    pub fn display(&self, path: PathId) -> &str {
        if self.is_root(path) {
            "<root>"
        } else {
            self.resolve(path)
        }
    }

    /// Name of the nearest field segment, skipping trailing array indices
    pub fn last_field(&self, path: PathId) -> Option<&str> {
        let mut current = Some(path);
        while let Some(id) = current {
            let node = self.node(id);
            match node.segment {
                Segment::Field(name) => return Some(self.names.resolve(&name)),
                Segment::Index(_) => current = node.parent,
                Segment::Root => return None,
            }
        }
        None
    }

    /// Number of interned paths
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root is interned
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn child(&mut self, parent: PathId, segment: Segment) -> PathId {
        if let Some(id) = self.children.get(&(parent, segment)) {
            return *id;
        }
        let parent_text = self.resolve(parent);
        let text = match segment {
            Segment::Field(name) if self.is_root(parent) => self.names.resolve(&name).to_string(),
            Segment::Field(name) => format!("{}.{}", parent_text, self.names.resolve(&name)),
            Segment::Index(index) => format!("{}[{}]", parent_text, index),
            Segment::Root => return parent,
        };

        let id = PathId(self.nodes.len() as u32);
        self.nodes.push(PathNode {
            parent: Some(parent),
            segment,
            text,
        });
        self.children.insert((parent, segment), id);
        id
    }

    fn node(&self, path: PathId) -> &PathNode {
        // Ids only come from this interner, which records a node for each of them.
        &self.nodes[path.index()]
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}
