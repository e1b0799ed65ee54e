use crate::hooks::HookKind;
use crate::keyed::{Key, KeyClass};

/// Fatal render failures. Any of these aborts the running pass and poisons
/// the runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("inconsistent hook order in {component} at slot {index}: expected {expected:?}, found {found:?}")]
    HookOrder {
        component: &'static str,
        index: usize,
        expected: HookKind,
        found: HookKind,
    },

    #[error("{component} called {found} hooks, previously {expected}")]
    HookCount {
        component: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("slot {index} in {component} holds a different value type than {kind:?} expects")]
    SlotType {
        component: &'static str,
        index: usize,
        kind: HookKind,
    },

    #[error("{component} returned {found} children, previously {expected}")]
    ChildCount {
        component: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("child type changed at {index} in {component}: {previous} -> {next}")]
    ChildType {
        component: &'static str,
        index: usize,
        previous: &'static str,
        next: &'static str,
    },

    #[error("duplicate key {key:?} in list of {component}")]
    DuplicateKey { component: &'static str, key: Key },

    #[error("key class changed in list of {component}: {previous:?} -> {next:?}")]
    KeyClass {
        component: &'static str,
        previous: KeyClass,
        next: KeyClass,
    },

    #[error("render pass started while another pass is active")]
    Reentrant,

    #[error("unknown reducer command {command} (table has {len} commands)")]
    UnknownCommand { command: usize, len: usize },

    #[error("render feedback loop: state changed during {frames} consecutive passes")]
    FeedbackLoop { frames: usize },

    #[error("runtime is poisoned by an earlier render failure")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_cross_threads() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn messages_name_the_component() {
        let err = Error::ChildCount {
            component: "list",
            expected: 2,
            found: 3,
        };
        assert_eq!(err.to_string(), "list returned 3 children, previously 2");
        let err = Error::DuplicateKey {
            component: "row",
            key: Key::Uint(4),
        };
        assert_eq!(err.to_string(), "duplicate key 4u in list of row");
    }
}
