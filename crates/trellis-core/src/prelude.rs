pub use crate::animation::{AnimationSpec, Clock, Easing, Interpolate, ManualClock, SystemClock};
pub use crate::call::{Call, Children, HasChildren, Render, RenderResult, node, node_with_children};
pub use crate::config::{BuildMode, Config};
pub use crate::effects::{Dispose, on_unmount};
pub use crate::element::{Attributes, ElementProps, el, element};
pub use crate::error::Error;
pub use crate::hooks::{CommandDispatch, Cx, Dispatch, Getter, ReducerTable, Setter};
pub use crate::keyed::{ItemProps, Key, Keyed, node_list};
pub use crate::memory::MemoryTarget;
pub use crate::runtime::{FrameReport, Runtime};
pub use crate::scheduler::FrameScheduler;
pub use crate::target::{AttrValue, NodeId, Target};
pub use crate::tree::InstanceId;
