//! # Trellis
//!
//! A small reactive rendering core. Components are plain functions of their
//! properties that return a description of child components; the runtime
//! keeps one instance per mounted component, re-invokes it when its inputs
//! change and applies the structural difference straight to a [`Target`].
//! There is no intermediate virtual tree.
//!
//! ## Components
//!
//! ```rust,ignore
//! use trellis_core::prelude::*;
//!
//! fn counter(cx: &mut Cx<'_>, label: &String) -> RenderResult {
//!     let (count, set_count, _) = cx.state(0)?;
//!     cx.effect_once(|| {
//!         log::info!("counter mounted");
//!         on_unmount(|| log::info!("counter unmounted"))
//!     })?;
//!     Ok(Render::children([Some(
//!         el("button").attr("title", format!("{label}: {count}")).call(),
//!     )]))
//! }
//! ```
//!
//! - A component is a function item `fn(&mut Cx<'_>, &P) -> RenderResult`.
//!   The item itself is the component's identity.
//! - The child list is positional: `None` keeps a slot empty, and the list
//!   length and the component at each position must not change between
//!   renders. Use [`node_list`] for collections.
//! - Returning [`Render::Abort`] leaves the previous output in place.
//!
//! ## Hooks
//!
//! Hooks are methods on [`Cx`]: `state`, `remember`, `effect`, `memo`,
//! `prev`, `async_memo`, `reducer`, `reducer_fn` and the helpers built on
//! them (`delay`, `transition`, `object_changes`). They are matched to their
//! stored slot by call order, see [`hooks`].
//!
//! ## Scheduling
//!
//! Setters mark their instance dirty and ask the host for a frame through a
//! [`FrameScheduler`]. Each [`Runtime::frame`] renders every dirty instance
//! once, in marking order; state changed while a pass is running is rendered
//! in the following frame.
//!
//! ## Build modes
//!
//! [`BuildMode::Strict`] (the default with debug assertions) checks hook
//! order, child counts, child types and list keys on every render and
//! reports violations as [`Error`]s. [`BuildMode::Fast`] skips those checks.

mod anchor;
pub mod animation;
pub mod call;
pub mod config;
pub mod effects;
pub mod element;
pub mod error;
pub mod hooks;
pub mod keyed;
pub mod memory;
pub mod prelude;
mod reconcile;
pub mod runtime;
mod scheduler;
pub mod target;
mod tree;

#[cfg(test)]
mod tests;

pub use animation::*;
pub use call::{
    Call, Children, ComponentId, HasChildren, Render, RenderResult, node, node_with_children,
};
pub use config::*;
pub use effects::*;
pub use element::*;
pub use error::Error;
pub use hooks::{
    CommandDispatch, Cx, Dispatch, Getter, HookKind, ReducerTable, Setter, object_diff,
};
pub use keyed::{ItemProps, Key, KeyClass, Keyed, node_list};
pub use memory::*;
pub use runtime::*;
pub use scheduler::FrameScheduler;
pub use target::*;
pub use tree::InstanceId;
