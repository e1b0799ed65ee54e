mod hooks;
mod scheduler;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::prelude::*;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Records an event for the current test thread.
pub(crate) fn record(event: impl Into<String>) {
    EVENTS.with(|e| e.borrow_mut().push(event.into()));
}

pub(crate) fn take_events() -> Vec<String> {
    EVENTS.with(|e| std::mem::take(&mut *e.borrow_mut()))
}

thread_local! {
    static HANDLES: RefCell<HashMap<TypeId, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Stores a hook handle so the test can drive the component from outside.
/// One handle per type; later calls replace earlier ones.
pub(crate) fn keep<H: 'static>(handle: H) {
    HANDLES.with(|h| {
        h.borrow_mut().insert(TypeId::of::<H>(), Box::new(handle));
    });
}

pub(crate) fn handle<H: Clone + 'static>() -> H {
    HANDLES.with(|h| {
        h.borrow()
            .get(&TypeId::of::<H>())
            .and_then(|handle| handle.downcast_ref::<H>())
            .cloned()
            .expect("no handle of this type was kept")
    })
}

pub(crate) fn root(children: Children) -> Result<(Attributes, Children), Error> {
    Ok((Attributes::new(), children))
}

#[derive(Default)]
pub(crate) struct CountingScheduler(AtomicUsize);

impl CountingScheduler {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FrameScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct Harness {
    pub runtime: Runtime<MemoryTarget>,
    pub body: NodeId,
    pub clock: ManualClock,
    pub scheduler: Arc<CountingScheduler>,
}

pub(crate) fn try_mount<B>(config: Config, body: B) -> Result<Harness, Error>
where
    B: Fn(&mut Cx<'_>) -> Result<(Attributes, Children), Error> + 'static,
{
    let mut target = MemoryTarget::new();
    let container = target.create_root("body");
    let clock = ManualClock::new();
    let scheduler = Arc::new(CountingScheduler::default());
    let runtime = Runtime::builder(target, container)
        .config(config)
        .clock(clock.clone())
        .frame_scheduler(scheduler.clone())
        .mount(body)?;
    Ok(Harness {
        runtime,
        body: container,
        clock,
        scheduler,
    })
}

pub(crate) fn mount<B>(body: B) -> Harness
where
    B: Fn(&mut Cx<'_>) -> Result<(Attributes, Children), Error> + 'static,
{
    try_mount(Config::strict(), body).expect("mount")
}

impl Harness {
    pub fn markup(&self) -> String {
        self.runtime.target().markup(self.body)
    }

    pub fn frame(&mut self) -> FrameReport {
        self.runtime.frame().expect("frame")
    }

    /// Runs frames until nothing is pending. Returns how many ran.
    pub fn settle(&mut self) -> usize {
        let mut frames = 0;
        while self.runtime.needs_frame() {
            self.frame();
            frames += 1;
            assert!(frames < 32, "runtime did not settle");
        }
        frames
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.runtime.target().children(self.body).to_vec()
    }
}
