//! Dirty queues, frame requests and the local task executor.
//!
//! Two ordered sets hold instances awaiting re-render: `current` is drained
//! by the next pass, `next` collects work discovered while a pass runs and is
//! promoted once the pass completes. Hook handles reach this state through a
//! weak [`Owner`] so they never keep a torn-down runtime alive.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

use crate::tree::InstanceId;

/// Host hook that arranges for [`Runtime::frame`](crate::Runtime::frame) to
/// be called on the next animation tick.
pub trait FrameScheduler: Send + Sync {
    fn schedule_frame(&self);
}

/// Insertion-ordered set of instances.
#[derive(Default)]
pub(crate) struct DirtySet {
    seq: u64,
    members: HashMap<InstanceId, u64>,
    order: VecDeque<(InstanceId, u64)>,
}

impl DirtySet {
    pub fn insert(&mut self, id: InstanceId) -> bool {
        if self.members.contains_key(&id) {
            return false;
        }
        self.seq += 1;
        self.members.insert(id, self.seq);
        self.order.push_back((id, self.seq));
        true
    }

    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.members.remove(&id).is_some()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn pop_front(&mut self) -> Option<InstanceId> {
        while let Some((id, seq)) = self.order.pop_front() {
            // entries removed (or removed and re-added later) are skipped
            if self.members.get(&id) == Some(&seq) {
                self.members.remove(&id);
                return Some(id);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mark {
    /// State changed; re-render as soon as possible.
    Changed,
    /// Explicit request for a render on the following frame.
    NextFrame,
}

#[derive(Default)]
pub(crate) struct DirtyQueues {
    pub current: DirtySet,
    pub next: DirtySet,
    pub in_pass: bool,
    pub frame_requested: bool,
    /// A state change was recorded while the running pass was active.
    pub changed_in_pass: bool,
}

impl DirtyQueues {
    /// Records a dirty mark. Returns true when the host must be asked for a
    /// frame.
    pub fn mark(&mut self, id: InstanceId, mark: Mark) -> bool {
        match mark {
            Mark::NextFrame => {
                self.next.insert(id);
                false
            }
            Mark::Changed if self.in_pass => {
                if !self.current.contains(id) {
                    self.changed_in_pass = true;
                    self.next.insert(id);
                }
                false
            }
            Mark::Changed => {
                self.current.insert(id);
                self.request_frame()
            }
        }
    }

    pub fn request_frame(&mut self) -> bool {
        !mem::replace(&mut self.frame_requested, true)
    }

    pub fn forget(&mut self, id: InstanceId) {
        self.current.remove(id);
        self.next.remove(id);
    }

    /// Moves the next-frame set into the current one. Returns true when a
    /// frame must be requested for it.
    pub fn promote_next(&mut self) -> bool {
        if self.next.is_empty() {
            return false;
        }
        if self.current.is_empty() {
            mem::swap(&mut self.current, &mut self.next);
            self.next.clear();
        } else {
            while let Some(id) = self.next.pop_front() {
                self.current.insert(id);
            }
        }
        self.request_frame()
    }
}

type Task = Pin<Box<dyn Future<Output = ()> + 'static>>;

struct TaskWake {
    woken: AtomicBool,
    scheduler: Option<Arc<dyn FrameScheduler>>,
}

impl futures_task::ArcWake for TaskWake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::SeqCst);
        if let Some(scheduler) = &arc_self.scheduler {
            scheduler.schedule_frame();
        }
    }
}

/// State shared between the runtime and the hook handles it hands out.
pub(crate) struct Shared {
    pub queues: RefCell<DirtyQueues>,
    tasks: RefCell<Vec<Task>>,
    frame_scheduler: Option<Arc<dyn FrameScheduler>>,
    wake: Arc<TaskWake>,
    waker: Waker,
}

impl Shared {
    pub fn new(frame_scheduler: Option<Arc<dyn FrameScheduler>>) -> Rc<Self> {
        let wake = Arc::new(TaskWake {
            woken: AtomicBool::new(false),
            scheduler: frame_scheduler.clone(),
        });
        let waker = futures_task::waker(wake.clone());
        Rc::new(Self {
            queues: RefCell::new(DirtyQueues::default()),
            tasks: RefCell::new(Vec::new()),
            frame_scheduler,
            wake,
            waker,
        })
    }

    pub fn mark(&self, id: InstanceId, mark: Mark) {
        let request = self.queues.borrow_mut().mark(id, mark);
        if request {
            self.schedule_frame();
        }
    }

    pub fn schedule_frame(&self) {
        if let Some(scheduler) = &self.frame_scheduler {
            scheduler.schedule_frame();
        }
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.tasks.borrow_mut().push(Box::pin(task));
        self.wake.woken.store(true, Ordering::SeqCst);
        let request = self.queues.borrow_mut().request_frame();
        if request {
            self.schedule_frame();
        }
    }

    /// Polls every pending task once. Returns how many completed.
    pub fn poll_tasks(&self) -> usize {
        self.wake.woken.store(false, Ordering::SeqCst);
        let tasks = mem::take(&mut *self.tasks.borrow_mut());
        if tasks.is_empty() {
            return 0;
        }
        let mut cx = Context::from_waker(&self.waker);
        let mut pending = Vec::with_capacity(tasks.len());
        let mut completed = 0;
        for mut task in tasks {
            match task.as_mut().poll(&mut cx) {
                Poll::Ready(()) => completed += 1,
                Poll::Pending => pending.push(task),
            }
        }
        self.tasks.borrow_mut().extend(pending);
        completed
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn woken(&self) -> bool {
        self.wake.woken.load(Ordering::SeqCst)
    }
}

/// Weak link from a hook handle back to the instance that owns it.
#[derive(Clone)]
pub(crate) struct Owner {
    id: InstanceId,
    shared: Weak<Shared>,
}

impl Owner {
    pub fn new(id: InstanceId, shared: &Rc<Shared>) -> Self {
        Self {
            id,
            shared: Rc::downgrade(shared),
        }
    }

    pub fn mark_dirty(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.mark(self.id, Mark::Changed);
        }
    }
}
