//! Keyed lists: children matched by key instead of position.
//!
//! A list is a transparent instance whose children are one instance per
//! item. Reordering items moves the existing instances (and their nodes)
//! without re-rendering them; only items whose properties changed render
//! again.

use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::anchor;
use crate::call::{AnyCall, Call, ComponentId, RenderResult, node, short_name};
use crate::error::Error;
use crate::hooks::Cx;
use crate::runtime::Runtime;
use crate::target::{NodeId, Target};
use crate::tree::InstanceId;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Uint(u64),
    Bool(bool),
    Char(char),
    Str(Arc<str>),
}

impl Key {
    pub fn class(&self) -> KeyClass {
        match self {
            Key::Int(_) => KeyClass::Int,
            Key::Uint(_) => KeyClass::Uint,
            Key::Bool(_) => KeyClass::Bool,
            Key::Char(_) => KeyClass::Char,
            Key::Str(_) => KeyClass::Str,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{v}"),
            Key::Uint(v) => write!(f, "{v}u"),
            Key::Bool(v) => write!(f, "{v}"),
            Key::Char(v) => write!(f, "{v:?}"),
            Key::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// Kind of value a key was derived from. Constant for a list's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Int,
    Uint,
    Bool,
    Char,
    Str,
}

/// Items of a keyed list. Primitives key by value; records return their id.
pub trait Keyed {
    fn key(&self) -> Key;
}

macro_rules! keyed_int {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(impl Keyed for $t {
            fn key(&self) -> Key {
                Key::$variant(*self as $wide)
            }
        })*
    };
}

keyed_int!(Int as i64: i8, i16, i32, i64, isize);
keyed_int!(Uint as u64: u8, u16, u32, u64, usize);

impl Keyed for bool {
    fn key(&self) -> Key {
        Key::Bool(*self)
    }
}

impl Keyed for char {
    fn key(&self) -> Key {
        Key::Char(*self)
    }
}

impl Keyed for &'static str {
    fn key(&self) -> Key {
        Key::Str(Arc::from(*self))
    }
}

impl Keyed for String {
    fn key(&self) -> Key {
        Key::Str(Arc::from(self.as_str()))
    }
}

impl Keyed for Arc<str> {
    fn key(&self) -> Key {
        Key::Str(self.clone())
    }
}

impl Keyed for Rc<str> {
    fn key(&self) -> Key {
        Key::Str(Arc::from(&**self))
    }
}

/// Properties each list item component receives.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemProps<T, S> {
    pub item: T,
    pub shared: Rc<S>,
}

pub(crate) trait ListSource {
    fn item_name(&self) -> &'static str;
    fn entries(&self) -> Vec<(Key, Call)>;
}

struct ListSentinel<F>(PhantomData<F>);

struct ListCall<F, T, S> {
    component: F,
    items: Vec<T>,
    shared: Rc<S>,
}

impl<F, T, S> AnyCall for ListCall<F, T, S>
where
    F: Fn(&mut Cx<'_>, &ItemProps<T, S>) -> RenderResult + Copy + 'static,
    T: Keyed + Clone + PartialEq + 'static,
    S: PartialEq + 'static,
{
    fn component_id(&self) -> ComponentId {
        ComponentId::of::<ListSentinel<F>>()
    }

    fn name(&self) -> &'static str {
        "list"
    }

    fn props(&self) -> &dyn Any {
        self
    }

    fn props_eq(&self, other: &dyn AnyCall) -> bool {
        other
            .props()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.items == self.items && other.shared == self.shared)
    }

    fn invoke(&self, _cx: &mut Cx<'_>) -> RenderResult {
        // reconciled by the runtime, never invoked
        Ok(crate::call::Render::Abort)
    }

    fn list(&self) -> Option<&dyn ListSource> {
        Some(self)
    }
}

impl<F, T, S> ListSource for ListCall<F, T, S>
where
    F: Fn(&mut Cx<'_>, &ItemProps<T, S>) -> RenderResult + Copy + 'static,
    T: Keyed + Clone + PartialEq + 'static,
    S: PartialEq + 'static,
{
    fn item_name(&self) -> &'static str {
        short_name(type_name::<F>())
    }

    fn entries(&self) -> Vec<(Key, Call)> {
        self.items
            .iter()
            .map(|item| {
                let props = ItemProps {
                    item: item.clone(),
                    shared: self.shared.clone(),
                };
                (item.key(), node(self.component, props))
            })
            .collect()
    }
}

/// Builds a keyed list rendering `component` once per item.
pub fn node_list<F, T, S>(component: F, items: Vec<T>, shared: S) -> Call
where
    F: Fn(&mut Cx<'_>, &ItemProps<T, S>) -> RenderResult + Copy + 'static,
    T: Keyed + Clone + PartialEq + 'static,
    S: PartialEq + 'static,
{
    Call(Rc::new(ListCall {
        component,
        items,
        shared: Rc::new(shared),
    }))
}

#[derive(Default)]
pub(crate) struct ListState {
    pub by_key: HashMap<Key, InstanceId>,
    pub by_id: HashMap<InstanceId, Key>,
    pub key_class: Option<KeyClass>,
}

impl ListState {
    pub fn key_of(&self, id: InstanceId) -> Option<&Key> {
        self.by_id.get(&id)
    }

    fn validate(&mut self, component: &'static str, entries: &[(Key, Call)]) -> Result<(), Error> {
        let mut seen = HashSet::with_capacity(entries.len());
        for (key, _) in entries {
            if !seen.insert(key) {
                return Err(Error::DuplicateKey {
                    component,
                    key: key.clone(),
                });
            }
            let class = key.class();
            match self.key_class {
                None => self.key_class = Some(class),
                Some(previous) if previous != class => {
                    return Err(Error::KeyClass {
                        component,
                        previous,
                        next: class,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl<T: Target> Runtime<T> {
    pub(crate) fn render_list(
        &mut self,
        id: InstanceId,
        host: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), Error> {
        let Some(instance) = self.tree.get_mut(id) else {
            return Ok(());
        };
        let call = instance.call.clone();
        let Some(list) = call.list() else {
            return Ok(());
        };
        let mut state = instance.list.take().unwrap_or_default();
        let entries = list.entries();
        let item_name = list.item_name();

        let result = self.reconcile_list(id, &mut state, item_name, entries, host, anchor);
        if let Some(instance) = self.tree.get_mut(id) {
            instance.list = Some(state);
        }
        result?;
        self.stats.renders += 1;
        anchor::refresh_first_node(&mut self.tree, id);
        Ok(())
    }

    fn reconcile_list(
        &mut self,
        id: InstanceId,
        state: &mut ListState,
        item_name: &'static str,
        mut entries: Vec<(Key, Call)>,
        host: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), Error> {
        if self.config.is_strict() {
            state.validate(item_name, &entries)?;
        } else {
            let mut seen = HashSet::with_capacity(entries.len());
            entries.retain(|(key, _)| {
                let first = seen.insert(key.clone());
                if !first {
                    log::warn!("list of {item_name}: duplicate key {key:?} ignored");
                }
                first
            });
        }

        let wanted: HashSet<&Key> = entries.iter().map(|(key, _)| key).collect();
        let vanished: Vec<(Key, InstanceId)> = state
            .by_key
            .iter()
            .filter(|(key, _)| !wanted.contains(key))
            .map(|(key, child)| (key.clone(), *child))
            .collect();
        for (key, child) in vanished {
            log::trace!("list of {item_name}: drop {key:?}");
            state.by_key.remove(&key);
            state.by_id.remove(&child);
            self.detach(child, host);
            self.unmount_subtree(child);
        }

        let mut ordered: Vec<Option<InstanceId>> = vec![None; entries.len()];
        let mut next_anchor = anchor;
        for (index, (key, call)) in entries.into_iter().enumerate().rev() {
            let child = match state.by_key.get(&key).copied() {
                Some(child) => {
                    let changed = self.tree.get(child).is_some_and(|c| c.call != call);
                    if changed {
                        if let Some(instance) = self.tree.get_mut(child) {
                            instance.call = call;
                        }
                        self.render(child, host, next_anchor)?;
                    } else {
                        self.stats.skipped += 1;
                    }
                    let moved = self
                        .tree
                        .get_mut(child)
                        .map(|c| std::mem::replace(&mut c.parent_index, index) != index)
                        .unwrap_or(false);
                    if moved {
                        log::trace!("list of {item_name}: move {key:?} to {index}");
                        anchor::reinsert(&self.tree, &mut self.target, child, host, next_anchor);
                        self.stats.moves += 1;
                    }
                    child
                }
                None => {
                    let child = self.mount(id, index, call, host, next_anchor)?;
                    state.by_id.insert(child, key.clone());
                    state.by_key.insert(key, child);
                    child
                }
            };
            ordered[index] = Some(child);
            if let Some(first) = self.tree.get(child).and_then(|c| c.first_node) {
                next_anchor = Some(first);
            }
        }

        if let Some(instance) = self.tree.get_mut(id) {
            instance.children = Some(ordered);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_keys_carry_their_class() {
        assert_eq!(3i32.key(), Key::Int(3));
        assert_eq!(3u8.key(), Key::Uint(3));
        assert_eq!("a".key().class(), KeyClass::Str);
        assert_eq!(String::from("a").key(), "a".key());
        assert_ne!(1i64.key().class(), 1u64.key().class());
    }

    fn item(_cx: &mut Cx<'_>, _props: &u32) -> RenderResult {
        Ok(crate::call::Render::Empty)
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let entries = vec![(Key::Int(1), node(item, 1)), (Key::Int(1), node(item, 2))];
        let mut state = ListState::default();
        let err = state.validate("item", &entries).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { key: Key::Int(1), .. }));
    }

    #[test]
    fn key_class_is_fixed_by_the_first_render() {
        let mut state = ListState::default();
        assert!(state.validate("item", &[]).is_ok());
        assert_eq!(state.key_class, None);

        let ints = vec![(Key::Int(1), node(item, 1))];
        assert!(state.validate("item", &ints).is_ok());
        assert_eq!(state.key_class, Some(KeyClass::Int));

        let strs = vec![(Key::Str(Arc::from("a")), node(item, 1))];
        let err = state.validate("item", &strs).unwrap_err();
        assert!(matches!(
            err,
            Error::KeyClass {
                previous: KeyClass::Int,
                next: KeyClass::Str,
                ..
            }
        ));
    }
}
