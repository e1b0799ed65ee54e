//! The runtime owns the instance tree, the target and the dirty queues, and
//! runs one render pass per [`Runtime::frame`].
//!
//! ```rust,ignore
//! let mut target = MemoryTarget::new();
//! let body = target.create_root("body");
//! let mut runtime = Runtime::builder(target, body)
//!     .config(Config::strict())
//!     .mount(|cx| Ok((Attributes::new(), vec![Some(node(app, ()))])))?;
//!
//! // host animation loop
//! while runtime.needs_frame() {
//!     runtime.frame()?;
//! }
//! ```

use std::any::Any;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;

use web_time::Instant;

use crate::anchor;
use crate::animation::{Clock, SystemClock};
use crate::call::{AnyCall, Call, Children, ComponentId, Render, RenderResult};
use crate::config::Config;
use crate::element::{Attributes, apply_attributes};
use crate::error::Error;
use crate::hooks::Cx;
use crate::keyed::Key;
use crate::scheduler::{FrameScheduler, Shared};
use crate::target::{NodeId, Target};
use crate::tree::{Instance, InstanceFlags, InstanceId, Tree, component_path};

/// Counters for one render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Component invocations, list reconciliations included.
    pub renders: usize,
    /// Children left alone because their call was unchanged.
    pub skipped: usize,
    pub mounts: usize,
    pub unmounts: usize,
    /// Keyed items moved without re-rendering.
    pub moves: usize,
    pub tasks_completed: usize,
}

/// Snapshot of one mounted instance, see [`Runtime::inspect`].
#[derive(Clone, Debug)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub name: &'static str,
    pub depth: usize,
    /// Key of a keyed-list item.
    pub key: Option<Key>,
    pub slots: usize,
    pub children: Option<usize>,
    pub owned_node: Option<NodeId>,
    pub first_node: Option<NodeId>,
    pub dirty: bool,
}

type RootBody = dyn Fn(&mut Cx<'_>) -> Result<(Attributes, Children), Error>;

struct RootCall {
    body: Box<RootBody>,
}

impl AnyCall for RootCall {
    fn component_id(&self) -> ComponentId {
        ComponentId::of::<RootCall>()
    }

    fn name(&self) -> &'static str {
        "root"
    }

    fn props(&self) -> &dyn Any {
        &()
    }

    fn props_eq(&self, _other: &dyn AnyCall) -> bool {
        false
    }

    fn invoke(&self, cx: &mut Cx<'_>) -> RenderResult {
        let (attributes, children) = (self.body)(cx)?;
        if let Some(node) = cx.node() {
            apply_attributes(cx, node, &attributes)?;
        }
        Ok(Render::Children(children))
    }
}

pub struct RuntimeBuilder<T: Target> {
    target: T,
    container: NodeId,
    config: Config,
    clock: Option<Box<dyn Clock>>,
    frame_scheduler: Option<Arc<dyn FrameScheduler>>,
}

impl<T: Target> RuntimeBuilder<T> {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn frame_scheduler(mut self, scheduler: Arc<dyn FrameScheduler>) -> Self {
        self.frame_scheduler = Some(scheduler);
        self
    }

    /// Mounts `body` as the root component over the container and renders it
    /// once. The attributes `body` returns are applied to the container.
    pub fn mount<B>(self, body: B) -> Result<Runtime<T>, Error>
    where
        B: Fn(&mut Cx<'_>) -> Result<(Attributes, Children), Error> + 'static,
    {
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let mut tree = Tree::with_key();
        let root = tree.insert(Instance::new(
            Call(Rc::new(RootCall {
                body: Box::new(body),
            })),
            None,
            0,
        ));
        if let Some(instance) = tree.get_mut(root) {
            instance.owned_node = Some(self.container);
            instance.flags.insert(InstanceFlags::ATTACHED);
        }

        let mut runtime = Runtime {
            tree,
            root,
            container: self.container,
            target: self.target,
            shared: Shared::new(self.frame_scheduler),
            config: self.config,
            frame_time: clock.now(),
            clock,
            chained: 0,
            poisoned: false,
            stats: FrameReport::default(),
        };
        log::debug!(
            "mounting root into {:?} ({:?} mode)",
            runtime.container,
            runtime.config.mode
        );
        runtime.shared.queues.borrow_mut().current.insert(root);
        runtime.run_pass()?;
        Ok(runtime)
    }
}

pub struct Runtime<T: Target> {
    pub(crate) tree: Tree,
    root: InstanceId,
    container: NodeId,
    pub(crate) target: T,
    pub(crate) shared: Rc<Shared>,
    pub(crate) config: Config,
    clock: Box<dyn Clock>,
    pub(crate) frame_time: Instant,
    chained: usize,
    poisoned: bool,
    pub(crate) stats: FrameReport,
}

impl<T: Target> Runtime<T> {
    pub fn builder(target: T, container: NodeId) -> RuntimeBuilder<T> {
        RuntimeBuilder {
            target,
            container,
            config: Config::default(),
            clock: None,
            frame_scheduler: None,
        }
    }

    /// Runs one frame: polls pending async work, then renders every dirty
    /// instance in the order it was marked. Work discovered during the pass
    /// is deferred to the next frame.
    ///
    /// Any error aborts the pass and poisons the runtime.
    pub fn frame(&mut self) -> Result<FrameReport, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if self.shared.queues.borrow().in_pass {
            return Err(Error::Reentrant);
        }
        self.frame_time = self.clock.now();
        let completed = self.shared.poll_tasks();
        // marks made while polling are rendered by this frame
        self.shared.queues.borrow_mut().frame_requested = false;

        match self.run_pass() {
            Ok(mut report) => {
                report.tasks_completed = completed;
                log::debug!("frame: {report:?}");
                Ok(report)
            }
            Err(err) => {
                self.poisoned = true;
                log::error!("render pass aborted: {err}");
                Err(err)
            }
        }
    }

    fn run_pass(&mut self) -> Result<FrameReport, Error> {
        {
            let mut queues = self.shared.queues.borrow_mut();
            if queues.in_pass {
                return Err(Error::Reentrant);
            }
            queues.in_pass = true;
            queues.changed_in_pass = false;
        }
        self.stats = FrameReport::default();

        let result = self.drain();

        let (cascaded, request) = {
            let mut queues = self.shared.queues.borrow_mut();
            queues.in_pass = false;
            (mem::take(&mut queues.changed_in_pass), queues.promote_next())
        };
        if request {
            self.shared.schedule_frame();
        }
        result?;

        self.chained = if cascaded { self.chained + 1 } else { 0 };
        if self.config.is_strict()
            && let Some(max) = self.config.max_chained_frames
            && self.chained > max
        {
            return Err(Error::FeedbackLoop {
                frames: self.chained,
            });
        }
        Ok(self.stats)
    }

    fn drain(&mut self) -> Result<(), Error> {
        loop {
            let next = self.shared.queues.borrow_mut().current.pop_front();
            let Some(id) = next else {
                return Ok(());
            };
            if !self.tree.contains_key(id) {
                continue;
            }
            let (host, anchor) = anchor::locate(&self.tree, id, self.container);
            if let Err(err) = self.render(id, host, anchor) {
                log::error!(
                    "render of {} failed: {err}",
                    component_path(&self.tree, id)
                );
                return Err(err);
            }
            anchor::propagate_first_node(&mut self.tree, id);
        }
    }

    /// Whether the host should call [`Runtime::frame`]: dirty instances,
    /// deferred renders or woken async work are pending.
    pub fn needs_frame(&self) -> bool {
        let queues = self.shared.queues.borrow();
        queues.frame_requested || !queues.current.is_empty() || self.shared.woken()
    }

    /// Unmounts the whole tree, running every cleanup, and hands the target
    /// back.
    pub fn unmount(mut self) -> T {
        let root = self.root;
        let children = self.tree.get_mut(root).and_then(|i| i.children.take());
        for child in children.into_iter().flatten().flatten() {
            self.detach(child, self.container);
            self.unmount_subtree(child);
        }
        self.unmount_subtree(root);
        log::debug!("unmounted root from {:?}", self.container);
        self.target
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn root(&self) -> InstanceId {
        self.root
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn instance_count(&self) -> usize {
        self.tree.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.shared.pending_tasks()
    }

    /// Component names from the root to `id`, e.g. `root>app>list>row`.
    pub fn path(&self, id: InstanceId) -> String {
        component_path(&self.tree, id)
    }

    /// Pre-order snapshot of the mounted tree.
    pub fn inspect(&self) -> Vec<InstanceInfo> {
        let queues = self.shared.queues.borrow();
        let mut out = Vec::with_capacity(self.tree.len());
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(instance) = self.tree.get(id) else {
                continue;
            };
            let key = instance
                .parent
                .and_then(|p| self.tree.get(p))
                .and_then(|p| p.list.as_ref())
                .and_then(|list| list.key_of(id))
                .cloned();
            out.push(InstanceInfo {
                id,
                name: instance.name(),
                depth,
                key,
                slots: instance.slots.len(),
                children: instance.children.as_ref().map(Vec::len),
                owned_node: instance.owned_node,
                first_node: instance.first_node,
                dirty: queues.current.contains(id) || queues.next.contains(id),
            });
            if let Some(children) = &instance.children {
                for child in children.iter().rev().flatten() {
                    stack.push((*child, depth + 1));
                }
            }
        }
        out
    }
}
