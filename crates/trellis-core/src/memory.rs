//! In-memory [`Target`] for tests and headless hosts.
//!
//! Keeps a plain node arena and logs every operation the reconciler issues,
//! so tests can assert both the resulting structure and the exact mutations
//! that produced it.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::target::{AttrValue, NodeId, Target};

#[derive(Clone, Debug, PartialEq)]
pub enum TargetOp {
    Create {
        node: NodeId,
        tag: String,
    },
    Insert {
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    },
    Remove {
        parent: NodeId,
        node: NodeId,
    },
    Release {
        node: NodeId,
    },
    SetAttribute {
        node: NodeId,
        name: String,
        value: Option<AttrValue>,
    },
    SetClasses {
        node: NodeId,
        classes: String,
    },
    SetStyle {
        node: NodeId,
        property: String,
        value: Option<String>,
    },
}

#[derive(Clone, Debug, Default)]
pub struct MemoryNode {
    pub tag: String,
    pub attributes: BTreeMap<String, AttrValue>,
    pub classes: String,
    pub style: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Default)]
pub struct MemoryTarget {
    nodes: HashMap<NodeId, MemoryNode>,
    next_id: u64,
    ops: Vec<TargetOp>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached container node without logging it.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            MemoryNode {
                tag: tag.to_string(),
                ..Default::default()
            },
        );
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn ops(&self) -> &[TargetOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<TargetOp> {
        std::mem::take(&mut self.ops)
    }

    /// Serializes the subtree at `id`, e.g.
    /// `<ul class="big"><li id="1"></li></ul>`.
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes);
        }
        if !node.style.is_empty() {
            let style = node
                .style
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(";");
            let _ = write!(out, " style=\"{style}\"");
        }
        out.push('>');
        for child in &node.children {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|child| *child != node);
        }
    }
}

impl Target for MemoryTarget {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.alloc(tag);
        self.ops.push(TargetOp::Create {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, anchor: Option<NodeId>) {
        self.ops.push(TargetOp::Insert {
            parent,
            node,
            anchor,
        });
        self.unlink(node);
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            log::warn!("insert into unknown node {parent:?}");
            return;
        };
        let position = match anchor {
            Some(anchor) => match parent_node.children.iter().position(|c| *c == anchor) {
                Some(position) => position,
                None => {
                    log::warn!("anchor {anchor:?} is not a child of {parent:?}; appending");
                    parent_node.children.len()
                }
            },
            None => parent_node.children.len(),
        };
        parent_node.children.insert(position, node);
        if let Some(node) = self.nodes.get_mut(&node) {
            node.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) {
        self.ops.push(TargetOp::Remove { parent, node });
        let is_child = self
            .nodes
            .get(&node)
            .is_some_and(|n| n.parent == Some(parent));
        if !is_child {
            log::warn!("{node:?} is not a child of {parent:?}");
            return;
        }
        self.unlink(node);
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&AttrValue>) {
        self.ops.push(TargetOp::SetAttribute {
            node,
            name: name.to_string(),
            value: value.cloned(),
        });
        if let Some(n) = self.nodes.get_mut(&node) {
            match value {
                Some(value) => {
                    n.attributes.insert(name.to_string(), value.clone());
                }
                None => {
                    n.attributes.remove(name);
                }
            }
        }
    }

    fn set_classes(&mut self, node: NodeId, classes: &str) {
        self.ops.push(TargetOp::SetClasses {
            node,
            classes: classes.to_string(),
        });
        if let Some(n) = self.nodes.get_mut(&node) {
            n.classes = classes.to_string();
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        self.ops.push(TargetOp::SetStyle {
            node,
            property: property.to_string(),
            value: value.map(str::to_string),
        });
        if let Some(n) = self.nodes.get_mut(&node) {
            match value {
                Some(value) => {
                    n.style.insert(property.to_string(), value.to_string());
                }
                None => {
                    n.style.remove(property);
                }
            }
        }
    }

    fn release(&mut self, node: NodeId) {
        self.ops.push(TargetOp::Release { node });
        self.unlink(node);
        let Some(released) = self.nodes.remove(&node) else {
            log::warn!("release of unknown node {node:?}");
            return;
        };
        for child in released.children {
            if let Some(child) = self.nodes.get_mut(&child) {
                child.parent = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_moves_attached_nodes() {
        let mut target = MemoryTarget::new();
        let root = target.create_root("ul");
        let a = target.create_element("a");
        let b = target.create_element("b");
        target.insert_before(root, a, None);
        target.insert_before(root, b, None);
        assert_eq!(target.children(root), &[a, b]);

        target.insert_before(root, b, Some(a));
        assert_eq!(target.children(root), &[b, a]);
        assert_eq!(target.markup(root), "<ul><b></b><a></a></ul>");
    }

    #[test]
    fn unknown_anchor_appends() {
        let mut target = MemoryTarget::new();
        let root = target.create_root("div");
        let a = target.create_element("a");
        target.insert_before(root, a, Some(NodeId(99)));
        assert_eq!(target.children(root), &[a]);
    }

    #[test]
    fn markup_includes_attributes_classes_and_style() {
        let mut target = MemoryTarget::new();
        let root = target.create_root("p");
        target.set_attribute(root, "id", Some(&AttrValue::from("x")));
        target.set_classes(root, "big red");
        target.set_style(root, "color", Some("red"));
        assert_eq!(
            target.markup(root),
            "<p id=\"x\" class=\"big red\" style=\"color:red\"></p>"
        );
        target.set_attribute(root, "id", None);
        target.set_style(root, "color", None);
        assert_eq!(target.markup(root), "<p class=\"big red\"></p>");
        assert_eq!(target.take_ops().len(), 5);
        assert!(target.ops().is_empty());
    }
}
