//! Insertion points for subtrees.
//!
//! Instances without a node of their own are transparent: their children's
//! nodes go straight into the nearest node-owning ancestor. Every instance
//! caches the first live node its subtree contributes (`first_node`), which
//! is what an earlier sibling inserts before.

use smallvec::SmallVec;

use crate::target::{NodeId, Target};
use crate::tree::{InstanceFlags, InstanceId, Tree};

/// Recomputes `first_node` of `id` from its own node or its children.
/// Returns whether the cached value changed.
pub(crate) fn refresh_first_node(tree: &mut Tree, id: InstanceId) -> bool {
    let Some(instance) = tree.get(id) else {
        return false;
    };
    let first = instance.owned_node.or_else(|| {
        instance
            .children
            .iter()
            .flatten()
            .flatten()
            .find_map(|child| tree.get(*child).and_then(|c| c.first_node))
    });
    match tree.get_mut(id) {
        Some(instance) if instance.first_node != first => {
            instance.first_node = first;
            true
        }
        _ => false,
    }
}

/// Pushes a changed `first_node` of `id` up through transparent ancestors.
pub(crate) fn propagate_first_node(tree: &mut Tree, id: InstanceId) {
    let mut cursor = id;
    while let Some(parent) = tree.get(cursor).and_then(|i| i.parent) {
        let owns_node = tree.get(parent).is_some_and(|p| p.owned_node.is_some());
        if owns_node || !refresh_first_node(tree, parent) {
            break;
        }
        cursor = parent;
    }
}

/// Host parent node and insertion anchor for re-rendering `id` in place.
///
/// The anchor is the first node of the nearest later sibling, looking
/// through transparent ancestors until a node-owning ancestor is reached.
pub(crate) fn locate(tree: &Tree, id: InstanceId, container: NodeId) -> (NodeId, Option<NodeId>) {
    let mut cursor = id;
    let mut anchor = None;
    loop {
        let Some(instance) = tree.get(cursor) else {
            return (container, anchor);
        };
        let Some(parent) = instance.parent.and_then(|p| tree.get(p)) else {
            return (container, anchor);
        };
        if anchor.is_none()
            && let Some(siblings) = &parent.children
        {
            anchor = siblings
                .get(instance.parent_index + 1..)
                .unwrap_or(&[])
                .iter()
                .flatten()
                .find_map(|sibling| tree.get(*sibling).and_then(|s| s.first_node));
        }
        if let Some(node) = parent.owned_node {
            return (node, anchor);
        }
        let Some(parent_id) = instance.parent else {
            return (container, anchor);
        };
        cursor = parent_id;
    }
}

/// Removes the top-level nodes of the subtree at `id` from `host`.
pub(crate) fn detach(tree: &mut Tree, target: &mut dyn Target, id: InstanceId, host: NodeId) {
    let Some(instance) = tree.get_mut(id) else {
        return;
    };
    if let Some(node) = instance.owned_node {
        if instance.flags.contains(InstanceFlags::ATTACHED) {
            instance.flags.remove(InstanceFlags::ATTACHED);
            target.remove_child(host, node);
        }
        return;
    }
    let children: SmallVec<[InstanceId; 8]> =
        instance.children.iter().flatten().flatten().copied().collect();
    for child in children {
        detach(tree, target, child, host);
    }
}

/// Moves the top-level nodes of the subtree at `id` before `anchor`, keeping
/// their relative order.
pub(crate) fn reinsert(
    tree: &Tree,
    target: &mut dyn Target,
    id: InstanceId,
    host: NodeId,
    anchor: Option<NodeId>,
) {
    let Some(instance) = tree.get(id) else {
        return;
    };
    if let Some(node) = instance.owned_node {
        if instance.flags.contains(InstanceFlags::ATTACHED) {
            target.insert_before(host, node, anchor);
        }
        return;
    }
    for child in instance.children.iter().flatten().flatten() {
        reinsert(tree, target, *child, host, anchor);
    }
}
