//! The boundary between the reconciler and whatever actually holds nodes.
//!
//! The core never creates or mutates nodes itself. Host components ask the
//! target for a node once, forward only the attributes that changed since the
//! previous render, and the reconciler issues `insert_before` / `remove_child`
//! with anchors it resolved from the instance tree.

use std::fmt;

/// Opaque handle to a node owned by a [`Target`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

pub trait Target {
    /// Creates a detached element node.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Inserts `node` into `parent` before `anchor`, or last when `anchor` is
    /// `None`. A node that is already attached somewhere is moved.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, anchor: Option<NodeId>);

    fn remove_child(&mut self, parent: NodeId, node: NodeId);

    /// `None` removes the attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&AttrValue>);

    /// Space separated list of active class flags.
    fn set_classes(&mut self, node: NodeId, classes: &str);

    /// `None` removes the style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>);

    /// The instance that created `node` was unmounted. Called children
    /// first; the node is never used again.
    fn release(&mut self, _node: NodeId) {}
}
