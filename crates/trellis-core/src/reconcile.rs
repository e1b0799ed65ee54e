//! Positional reconciliation of an instance against the child list its
//! component returned.

use std::mem;

use crate::anchor;
use crate::call::{Call, Children, Render};
use crate::error::Error;
use crate::hooks::Cx;
use crate::runtime::Runtime;
use crate::target::{NodeId, Target};
use crate::tree::{Instance, InstanceFlags, InstanceId};

impl<T: Target> Runtime<T> {
    /// Renders `id` whose nodes belong in `host` before `anchor`.
    pub(crate) fn render(
        &mut self,
        id: InstanceId,
        host: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), Error> {
        self.shared.queues.borrow_mut().current.remove(id);

        let Some(instance) = self.tree.get_mut(id) else {
            return Ok(());
        };
        let call = instance.call.clone();
        if call.is_list() {
            return self.render_list(id, host, anchor);
        }

        let mut slots = mem::take(&mut instance.slots);
        let flags = instance.flags;
        let mut cx = Cx {
            id,
            name: call.name(),
            slots: &mut slots,
            cursor: 0,
            first_render: !flags.contains(InstanceFlags::RENDERED),
            sealed: flags.contains(InstanceFlags::SEALED),
            strict: self.config.is_strict(),
            owned_node: instance.owned_node,
            target: &mut self.target,
            shared: &self.shared,
            frame_time: self.frame_time,
        };
        let result = call.invoke(&mut cx).and_then(|render| {
            if !matches!(render, Render::Abort) {
                cx.finish()?;
            }
            Ok(render)
        });
        let owned_node = cx.owned_node;

        let Some(instance) = self.tree.get_mut(id) else {
            return Ok(());
        };
        instance.slots = slots;
        instance.owned_node = owned_node;
        instance.flags.insert(InstanceFlags::RENDERED);
        self.stats.renders += 1;

        match result? {
            Render::Abort => {
                log::trace!("{} aborted its render", call.name());
            }
            Render::Empty => {
                instance.flags.insert(InstanceFlags::SEALED);
                let children_host = owned_node.unwrap_or(host);
                if let Some(children) = instance.children.take() {
                    for child in children.into_iter().flatten() {
                        self.detach(child, children_host);
                        self.unmount_subtree(child);
                    }
                }
            }
            Render::Children(calls) => {
                instance.flags.insert(InstanceFlags::SEALED);
                self.reconcile_children(id, &call, calls, host, anchor)?;
            }
        }

        self.attach(id, host, anchor);
        anchor::refresh_first_node(&mut self.tree, id);
        Ok(())
    }

    fn reconcile_children(
        &mut self,
        id: InstanceId,
        call: &Call,
        calls: Children,
        host: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), Error> {
        let Some(instance) = self.tree.get_mut(id) else {
            return Ok(());
        };
        let (children_host, anchor) = match instance.owned_node {
            Some(node) => (node, None),
            None => (host, anchor),
        };
        let previous = instance.children.take();

        if let Some(previous) = &previous
            && previous.len() != calls.len()
        {
            if self.config.is_strict() {
                let expected = previous.len();
                instance.children = Some(previous.clone());
                return Err(Error::ChildCount {
                    component: call.name(),
                    expected,
                    found: calls.len(),
                });
            }
            log::warn!(
                "{} returned {} children, previously {}",
                call.name(),
                calls.len(),
                previous.len()
            );
        }

        let mut children = previous.unwrap_or_default();
        while children.len() > calls.len() {
            if let Some(Some(child)) = children.pop() {
                self.detach(child, children_host);
                self.unmount_subtree(child);
            }
        }
        children.resize(calls.len(), None);

        let result =
            self.reconcile_positions(id, call, &mut children, calls, children_host, anchor);
        if let Some(instance) = self.tree.get_mut(id) {
            instance.children = Some(children);
        }
        result
    }

    /// Walks positions from last to first so each child can be inserted
    /// before the first node of the already reconciled position after it.
    fn reconcile_positions(
        &mut self,
        id: InstanceId,
        call: &Call,
        children: &mut [Option<InstanceId>],
        calls: Children,
        host: NodeId,
        mut anchor: Option<NodeId>,
    ) -> Result<(), Error> {
        for (index, next) in calls.into_iter().enumerate().rev() {
            let existing = children[index];
            match (existing, next) {
                (None, None) => {}
                (Some(child), None) => {
                    self.detach(child, host);
                    self.unmount_subtree(child);
                    children[index] = None;
                }
                (Some(child), Some(next)) => {
                    let Some(current) = self.tree.get_mut(child) else {
                        children[index] = Some(self.mount(id, index, next, host, anchor)?);
                        continue;
                    };
                    if !current.call.same_component(&next) {
                        if self.config.is_strict() {
                            return Err(Error::ChildType {
                                component: call.name(),
                                index,
                                previous: current.call.name(),
                                next: next.name(),
                            });
                        }
                        log::warn!(
                            "{} replaced {} with {} at {index}",
                            call.name(),
                            current.call.name(),
                            next.name()
                        );
                        self.detach(child, host);
                        self.unmount_subtree(child);
                        children[index] = Some(self.mount(id, index, next, host, anchor)?);
                    } else if current.call == next {
                        self.stats.skipped += 1;
                    } else {
                        current.call = next;
                        self.render(child, host, anchor)?;
                    }
                }
                (None, Some(next)) => {
                    children[index] = Some(self.mount(id, index, next, host, anchor)?);
                }
            }
            if let Some(first) = children[index]
                .and_then(|child| self.tree.get(child))
                .and_then(|child| child.first_node)
            {
                anchor = Some(first);
            }
        }
        Ok(())
    }

    /// Creates an instance for `call` at `index` under `parent` and renders it
    /// into place.
    pub(crate) fn mount(
        &mut self,
        parent: InstanceId,
        index: usize,
        call: Call,
        host: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<InstanceId, Error> {
        log::trace!("mount {} at {index}", call.name());
        let id = self.tree.insert(Instance::new(call, Some(parent), index));
        self.stats.mounts += 1;
        self.render(id, host, anchor)?;
        Ok(id)
    }

    /// Tears down the subtree at `id`: children first, then the instance's
    /// own hook cleanups. Top-level nodes are left to the caller to detach;
    /// owned nodes are released, except the root container.
    pub(crate) fn unmount_subtree(&mut self, id: InstanceId) {
        let children = self.tree.get_mut(id).and_then(|i| i.children.take());
        for child in children.into_iter().flatten().flatten() {
            self.unmount_subtree(child);
        }
        let Some(mut instance) = self.tree.remove(id) else {
            return;
        };
        log::trace!("unmount {}", instance.name());
        for slot in instance.slots.iter_mut() {
            slot.unmount();
        }
        if let Some(node) = instance.owned_node
            && instance.parent.is_some()
        {
            self.target.release(node);
        }
        self.shared.queues.borrow_mut().forget(id);
        self.stats.unmounts += 1;
    }

    pub(crate) fn detach(&mut self, id: InstanceId, host: NodeId) {
        anchor::detach(&mut self.tree, &mut self.target, id, host);
    }

    /// Inserts the instance's own node if it is not in the target yet.
    fn attach(&mut self, id: InstanceId, host: NodeId, anchor: Option<NodeId>) {
        let Some(instance) = self.tree.get_mut(id) else {
            return;
        };
        if let Some(node) = instance.owned_node
            && !instance.flags.contains(InstanceFlags::ATTACHED)
        {
            instance.flags.insert(InstanceFlags::ATTACHED);
            self.target.insert_before(host, node, anchor);
        }
    }
}
