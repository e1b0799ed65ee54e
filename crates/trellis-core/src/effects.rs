use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Cleanup returned by an effect. Runs before the effect runs again and when
/// the owning instance unmounts.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispose").field(&!self.is_spent()).finish()
    }
}

/// Helper for effects that only need cleanup.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Option<Dispose> {
    Some(Dispose::new(f))
}
