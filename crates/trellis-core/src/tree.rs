use bitflags::bitflags;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::call::Call;
use crate::hooks::HookSlot;
use crate::keyed::ListState;
use crate::target::NodeId;

new_key_type! {
    /// Handle of a mounted instance. Stale handles (unmounted instances)
    /// never resolve again, even if the arena slot is reused.
    pub struct InstanceId;
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct InstanceFlags: u8 {
        /// The component has been invoked at least once.
        const RENDERED = 1 << 0;
        /// A render completed; slot count and kinds are now fixed.
        const SEALED = 1 << 1;
        /// `owned_node` is inserted into its target parent.
        const ATTACHED = 1 << 2;
    }
}

pub(crate) struct Instance {
    pub call: Call,
    pub parent: Option<InstanceId>,
    pub parent_index: usize,
    pub slots: Vec<Box<dyn HookSlot>>,
    pub children: Option<Vec<Option<InstanceId>>>,
    pub owned_node: Option<NodeId>,
    pub first_node: Option<NodeId>,
    pub flags: InstanceFlags,
    pub list: Option<ListState>,
}

impl Instance {
    pub fn new(call: Call, parent: Option<InstanceId>, parent_index: usize) -> Self {
        Self {
            call,
            parent,
            parent_index,
            slots: Vec::new(),
            children: None,
            owned_node: None,
            first_node: None,
            flags: InstanceFlags::empty(),
            list: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.call.name()
    }
}

pub(crate) type Tree = SlotMap<InstanceId, Instance>;

/// Component names from the root down to `id`, joined with `>`.
pub(crate) fn component_path(tree: &Tree, id: InstanceId) -> String {
    let mut names: SmallVec<[&str; 8]> = SmallVec::new();
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        let Some(instance) = tree.get(current) else {
            break;
        };
        names.push(instance.name());
        cursor = instance.parent;
    }
    if names.is_empty() {
        return "-".to_string();
    }
    names.reverse();
    names.join(">")
}
