//! # Hooks
//!
//! Every piece of per-instance state lives in an ordered list of slots owned
//! by the instance. A render walks that list with a cursor: the Nth hook call
//! always refers to the Nth slot, so hooks must be called unconditionally and
//! in the same order on every render.
//!
//! ```rust,ignore
//! fn counter(cx: &mut Cx<'_>, step: &i32) -> RenderResult {
//!     let (count, set_count, _) = cx.state(0)?;
//!     let step = *step;
//!     cx.effect(count, |count| {
//!         log::info!("count is now {count}");
//!         None
//!     })?;
//!     Ok(Render::children([Some(
//!         el("span").attr("total", count * step).call(),
//!     )]))
//! }
//! ```
//!
//! Handles returned by hooks ([`Setter`], [`Getter`], [`Dispatch`],
//! [`CommandDispatch`]) are cheap to clone, compare by identity and stay
//! valid after the instance unmounts; writes through them are then ignored
//! by the scheduler.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::mem;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::animation::{AnimationSpec, Interpolate, Segment};
use crate::effects::Dispose;
use crate::error::Error;
use crate::scheduler::{Mark, Owner, Shared};
use crate::target::{NodeId, Target};
use crate::tree::InstanceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    State,
    Static,
    Effect,
    Async,
    Memo,
    Prev,
    Reducer,
    ReducerFn,
}

pub(crate) trait HookSlot: Any {
    fn kind(&self) -> HookKind;

    /// Called once when the owning instance unmounts, in slot order.
    fn unmount(&mut self) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Render context handed to a component. Carries the instance being
/// rendered, its hook cursor and the target.
pub struct Cx<'a> {
    pub(crate) id: InstanceId,
    pub(crate) name: &'static str,
    pub(crate) slots: &'a mut Vec<Box<dyn HookSlot>>,
    pub(crate) cursor: usize,
    pub(crate) first_render: bool,
    pub(crate) sealed: bool,
    pub(crate) strict: bool,
    pub(crate) owned_node: Option<NodeId>,
    pub(crate) target: &'a mut dyn Target,
    pub(crate) shared: &'a Rc<Shared>,
    pub(crate) frame_time: Instant,
}

impl<'a> Cx<'a> {
    pub fn instance_id(&self) -> InstanceId {
        self.id
    }

    pub fn component_name(&self) -> &'static str {
        self.name
    }

    fn owner(&self) -> Owner {
        Owner::new(self.id, self.shared)
    }

    fn next_slot<S: HookSlot>(
        &mut self,
        kind: HookKind,
        init: impl FnOnce() -> S,
    ) -> Result<&mut S, Error> {
        let index = self.cursor;
        self.cursor += 1;

        if index >= self.slots.len() {
            if self.strict && self.sealed {
                return Err(Error::HookCount {
                    component: self.name,
                    expected: self.slots.len(),
                    found: index + 1,
                });
            }
            self.slots.push(Box::new(init()));
        } else if self.strict {
            let found = self.slots[index].kind();
            if found != kind {
                return Err(Error::HookOrder {
                    component: self.name,
                    index,
                    expected: found,
                    found: kind,
                });
            }
        }

        let component = self.name;
        self.slots[index]
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(Error::SlotType {
                component,
                index,
                kind,
            })
    }

    /// Verifies the hook count once the component returned.
    pub(crate) fn finish(&self) -> Result<(), Error> {
        if self.strict && self.sealed && self.cursor != self.slots.len() {
            return Err(Error::HookCount {
                component: self.name,
                expected: self.slots.len(),
                found: self.cursor,
            });
        }
        Ok(())
    }

    /// Persistent value. The setter stores and schedules a re-render only
    /// when the new value differs from the stored one.
    pub fn state<T>(&mut self, initial: T) -> Result<(T, Setter<T>, Getter<T>), Error>
    where
        T: Clone + PartialEq + 'static,
    {
        let owner = self.owner();
        let slot = self.next_slot::<StateSlot<T>>(HookKind::State, || StateSlot {
            cell: Rc::new(Tracked::new(initial, owner)),
        })?;
        let value = slot.cell.value.borrow().clone();
        Ok((value, Setter(slot.cell.clone()), Getter(slot.cell.clone())))
    }

    /// Value created on the first render and returned unchanged afterwards.
    pub fn remember<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<Rc<T>, Error> {
        let slot = self.next_slot::<StaticSlot<T>>(HookKind::Static, || StaticSlot {
            value: Rc::new(init()),
        })?;
        Ok(slot.value.clone())
    }

    /// Runs `f` on the first render and whenever `deps` differs from the
    /// previous render. The cleanup returned by the previous run, if any, runs
    /// first.
    pub fn effect<D>(
        &mut self,
        deps: D,
        f: impl FnOnce(&D) -> Option<Dispose>,
    ) -> Result<(), Error>
    where
        D: PartialEq + 'static,
    {
        let slot = self.next_slot::<EffectSlot<D>>(HookKind::Effect, || EffectSlot {
            deps: None,
            cleanup: None,
        })?;
        if slot.deps.as_ref() == Some(&deps) {
            return Ok(());
        }
        if let Some(cleanup) = slot.cleanup.take() {
            cleanup.run();
        }
        slot.cleanup = f(&deps);
        slot.deps = Some(deps);
        Ok(())
    }

    /// Effect without dependencies: runs on the first render only.
    pub fn effect_once(&mut self, f: impl FnOnce() -> Option<Dispose>) -> Result<(), Error> {
        self.effect((), |_| f())
    }

    /// Last resolved value of `getter`, or `fallback` before the first
    /// resolution. A new resolution starts whenever `deps` changes; results of
    /// superseded resolutions are discarded.
    pub fn async_memo<D, T, Fut>(
        &mut self,
        deps: D,
        fallback: T,
        getter: impl FnOnce(&D) -> Fut,
    ) -> Result<T, Error>
    where
        D: PartialEq + 'static,
        T: Clone + PartialEq + 'static,
        Fut: Future<Output = T> + 'static,
    {
        self.async_value(deps, fallback, getter, false)
    }

    /// Like [`Cx::async_memo`], but shows `fallback` again while a new
    /// resolution is pending.
    pub fn async_memo_reset<D, T, Fut>(
        &mut self,
        deps: D,
        fallback: T,
        getter: impl FnOnce(&D) -> Fut,
    ) -> Result<T, Error>
    where
        D: PartialEq + 'static,
        T: Clone + PartialEq + 'static,
        Fut: Future<Output = T> + 'static,
    {
        self.async_value(deps, fallback, getter, true)
    }

    fn async_value<D, T, Fut>(
        &mut self,
        deps: D,
        fallback: T,
        getter: impl FnOnce(&D) -> Fut,
        reset: bool,
    ) -> Result<T, Error>
    where
        D: PartialEq + 'static,
        T: Clone + PartialEq + 'static,
        Fut: Future<Output = T> + 'static,
    {
        let owner = self.owner();
        let shared = self.shared.clone();
        let name = self.name;
        let slot = self.next_slot::<AsyncSlot<D, T>>(HookKind::Async, || AsyncSlot {
            deps: None,
            cell: Rc::new(AsyncCell {
                tracked: Tracked::new(fallback.clone(), owner),
                generation: Cell::new(0),
            }),
        })?;

        if slot.deps.as_ref() != Some(&deps) {
            let generation = slot.cell.generation.get() + 1;
            slot.cell.generation.set(generation);
            if reset {
                slot.cell.tracked.replace(fallback);
            }
            log::trace!("async start in {name} (generation {generation})");
            let pending = getter(&deps);
            slot.deps = Some(deps);
            let cell = slot.cell.clone();
            shared.spawn(async move {
                let value = pending.await;
                if cell.generation.get() != generation {
                    log::trace!("async result of {name} discarded (stale)");
                    return;
                }
                cell.tracked.set(value);
            });
        }

        let value = slot.cell.tracked.value.borrow().clone();
        Ok(value)
    }

    /// Result of `compute`, recomputed only when `deps` changes.
    pub fn memo<D, T>(&mut self, deps: D, compute: impl FnOnce(&D) -> T) -> Result<Rc<T>, Error>
    where
        D: PartialEq + 'static,
        T: 'static,
    {
        let slot = self.next_slot::<MemoSlot<D, T>>(HookKind::Memo, || MemoSlot {
            deps: None,
            value: None,
        })?;
        if let (Some(previous), Some(value)) = (&slot.deps, &slot.value)
            && *previous == deps
        {
            return Ok(value.clone());
        }
        let value = Rc::new(compute(&deps));
        slot.deps = Some(deps);
        slot.value = Some(value.clone());
        Ok(value)
    }

    /// The `value` passed on the previous render (`initial` on the first).
    pub fn prev<T: 'static>(&mut self, value: T, initial: T) -> Result<T, Error> {
        let slot = self.next_slot::<PrevSlot<T>>(HookKind::Prev, || PrevSlot { value: initial })?;
        Ok(mem::replace(&mut slot.value, value))
    }

    /// State driven by a fixed command table. See [`ReducerTable`].
    pub fn reducer<T, A>(
        &mut self,
        table: &'static ReducerTable<T, A>,
    ) -> Result<(T, CommandDispatch<T, A>), Error>
    where
        T: Clone + PartialEq + 'static,
        A: 'static,
    {
        let owner = self.owner();
        let slot = self.next_slot::<ReducerSlot<T, A>>(HookKind::Reducer, || ReducerSlot {
            dispatch: CommandDispatch {
                cell: Rc::new(Tracked::new((table.init)(), owner)),
                table,
            },
        })?;
        let value = slot.dispatch.cell.value.borrow().clone();
        Ok((value, slot.dispatch.clone()))
    }

    /// State driven by a single reducer function. The initial value comes
    /// from `init`, or `T::default()` when absent.
    pub fn reducer_fn<T, A>(
        &mut self,
        reduce: fn(&T, A) -> T,
        init: Option<fn() -> T>,
    ) -> Result<(T, Dispatch<T, A>), Error>
    where
        T: Clone + PartialEq + Default + 'static,
        A: 'static,
    {
        let owner = self.owner();
        let slot = self.next_slot::<ReducerFnSlot<T, A>>(HookKind::ReducerFn, || {
            let initial = init.map(|init| init()).unwrap_or_default();
            ReducerFnSlot {
                dispatch: Dispatch {
                    cell: Rc::new(Tracked::new(initial, owner)),
                    reduce,
                },
            }
        })?;
        let value = slot.dispatch.cell.value.borrow().clone();
        Ok((value, slot.dispatch.clone()))
    }

    pub fn is_first_render(&self) -> bool {
        self.first_render
    }

    /// Schedules this instance for the following frame.
    pub fn request_rerender(&self) {
        self.shared.mark(self.id, Mark::NextFrame);
    }

    /// Time of the current frame; identical for every render in a frame.
    pub fn frame_time(&self) -> Instant {
        self.frame_time
    }

    /// False until `duration` has passed since the hook first saw this
    /// duration. Re-renders every frame while waiting.
    pub fn delay(&mut self, duration: Duration) -> Result<bool, Error> {
        let now = self.frame_time;
        let started = self.memo(duration, |_| now)?;
        let expired = now.duration_since(*started) >= duration;
        if !expired {
            self.request_rerender();
        }
        Ok(expired)
    }

    /// Eases from the previously returned value toward `target`. A new
    /// target restarts the transition from wherever the value currently is.
    pub fn transition<T>(&mut self, target: T, spec: AnimationSpec) -> Result<T, Error>
    where
        T: Interpolate + Clone + PartialEq + 'static,
    {
        let now = self.frame_time;
        let current = self.remember(|| RefCell::new(target.clone()))?;
        let segment = self.memo(target, |to| {
            let start = now + spec.delay;
            Segment {
                from: current.borrow().clone(),
                to: to.clone(),
                start,
                end: start + spec.duration,
                easing: spec.easing,
            }
        })?;
        let value = segment.sample(now);
        *current.borrow_mut() = value.clone();
        if value != segment.to {
            self.request_rerender();
        }
        Ok(value)
    }

    /// Keys of `object` whose value differs from the map passed on the
    /// previous render, including removed keys. All keys on the first render.
    pub fn object_changes<K, V>(&mut self, object: &BTreeMap<K, V>) -> Result<Vec<K>, Error>
    where
        K: Ord + Clone + 'static,
        V: PartialEq + Clone + 'static,
    {
        let previous = self.prev(object.clone(), BTreeMap::new())?;
        Ok(object_diff(&previous, object))
    }

    /// Node owned by this instance, created through `create` on first use.
    /// The reconciler attaches it and reconciles children into it.
    pub fn own_node(&mut self, create: impl FnOnce(&mut dyn Target) -> NodeId) -> NodeId {
        if let Some(node) = self.owned_node {
            return node;
        }
        let node = create(&mut *self.target);
        self.owned_node = Some(node);
        node
    }

    pub fn node(&self) -> Option<NodeId> {
        self.owned_node
    }

    pub fn target(&mut self) -> &mut dyn Target {
        &mut *self.target
    }
}

/// Keys present in either map whose values differ, in key order.
pub fn object_diff<K, V>(previous: &BTreeMap<K, V>, next: &BTreeMap<K, V>) -> Vec<K>
where
    K: Ord + Clone,
    V: PartialEq,
{
    let mut changed: Vec<K> = next
        .iter()
        .filter(|(key, value)| previous.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.extend(
        previous
            .keys()
            .filter(|key| !next.contains_key(*key))
            .cloned(),
    );
    changed.sort();
    changed
}

/// A value that schedules its owner when it changes.
pub(crate) struct Tracked<T> {
    pub value: RefCell<T>,
    owner: Owner,
}

impl<T: PartialEq> Tracked<T> {
    fn new(value: T, owner: Owner) -> Self {
        Self {
            value: RefCell::new(value),
            owner,
        }
    }

    /// Stores `next`. Returns whether the value changed.
    fn replace(&self, next: T) -> bool {
        let mut value = self.value.borrow_mut();
        if *value == next {
            return false;
        }
        *value = next;
        true
    }

    fn set(&self, next: T) {
        if self.replace(next) {
            self.owner.mark_dirty();
        }
    }
}

struct StateSlot<T> {
    cell: Rc<Tracked<T>>,
}

impl<T: 'static> HookSlot for StateSlot<T> {
    fn kind(&self) -> HookKind {
        HookKind::State
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct Setter<T>(Rc<Tracked<T>>);

impl<T: PartialEq> Setter<T> {
    pub fn set(&self, value: T) {
        self.0.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.0.value.borrow());
        self.0.set(next);
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Setter(self.0.clone())
    }
}

impl<T> PartialEq for Setter<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Setter")
    }
}

/// Reads the current stored value, including writes made since the render
/// that returned it.
pub struct Getter<T>(Rc<Tracked<T>>);

impl<T> Getter<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }
}

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self {
        Getter(self.0.clone())
    }
}

impl<T> PartialEq for Getter<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> fmt::Debug for Getter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Getter")
    }
}

struct StaticSlot<T> {
    value: Rc<T>,
}

impl<T: 'static> HookSlot for StaticSlot<T> {
    fn kind(&self) -> HookKind {
        HookKind::Static
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct EffectSlot<D> {
    deps: Option<D>,
    cleanup: Option<Dispose>,
}

impl<D: 'static> HookSlot for EffectSlot<D> {
    fn kind(&self) -> HookKind {
        HookKind::Effect
    }

    fn unmount(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.run();
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct AsyncCell<T> {
    tracked: Tracked<T>,
    generation: Cell<u64>,
}

struct AsyncSlot<D, T> {
    deps: Option<D>,
    cell: Rc<AsyncCell<T>>,
}

impl<D: 'static, T: 'static> HookSlot for AsyncSlot<D, T> {
    fn kind(&self) -> HookKind {
        HookKind::Async
    }

    fn unmount(&mut self) {
        // any resolution still in flight becomes stale
        let generation = self.cell.generation.get();
        self.cell.generation.set(generation + 1);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct MemoSlot<D, T> {
    deps: Option<D>,
    value: Option<Rc<T>>,
}

impl<D: 'static, T: 'static> HookSlot for MemoSlot<D, T> {
    fn kind(&self) -> HookKind {
        HookKind::Memo
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct PrevSlot<T> {
    value: T,
}

impl<T: 'static> HookSlot for PrevSlot<T> {
    fn kind(&self) -> HookKind {
        HookKind::Prev
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Command table for [`Cx::reducer`]. Command `0` re-runs `init`; command
/// `n` applies `actions[n - 1]` to the current value.
///
/// ```rust,ignore
/// static COUNTER: ReducerTable<i32, i32> = ReducerTable {
///     init: || 0,
///     actions: &[|value, by| value + by, |value, by| value - by],
/// };
/// ```
pub struct ReducerTable<T: 'static, A: 'static> {
    pub init: fn() -> T,
    pub actions: &'static [fn(&T, A) -> T],
}

impl<T: 'static, A: 'static> ReducerTable<T, A> {
    /// Number of valid commands, including the reset command.
    pub fn len(&self) -> usize {
        self.actions.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

pub struct CommandDispatch<T: 'static, A: 'static> {
    cell: Rc<Tracked<T>>,
    table: &'static ReducerTable<T, A>,
}

impl<T: PartialEq + 'static, A: 'static> CommandDispatch<T, A> {
    pub fn dispatch(&self, command: usize, payload: A) -> Result<(), Error> {
        let next = match command {
            0 => (self.table.init)(),
            n => {
                let action = self.table.actions.get(n - 1).ok_or(Error::UnknownCommand {
                    command,
                    len: self.table.len(),
                })?;
                let value = self.cell.value.borrow();
                action(&value, payload)
            }
        };
        self.cell.set(next);
        Ok(())
    }
}

impl<T: 'static, A: 'static> Clone for CommandDispatch<T, A> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            table: self.table,
        }
    }
}

impl<T: 'static, A: 'static> PartialEq for CommandDispatch<T, A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: 'static, A: 'static> fmt::Debug for CommandDispatch<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatch")
            .field("commands", &self.table.len())
            .finish()
    }
}

struct ReducerSlot<T: 'static, A: 'static> {
    dispatch: CommandDispatch<T, A>,
}

impl<T: 'static, A: 'static> HookSlot for ReducerSlot<T, A> {
    fn kind(&self) -> HookKind {
        HookKind::Reducer
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct Dispatch<T, A> {
    cell: Rc<Tracked<T>>,
    reduce: fn(&T, A) -> T,
}

impl<T: PartialEq, A> Dispatch<T, A> {
    pub fn dispatch(&self, action: A) {
        let next = {
            let value = self.cell.value.borrow();
            (self.reduce)(&value, action)
        };
        self.cell.set(next);
    }
}

impl<T, A> Clone for Dispatch<T, A> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            reduce: self.reduce,
        }
    }
}

impl<T, A> PartialEq for Dispatch<T, A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T, A> fmt::Debug for Dispatch<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatch")
    }
}

struct ReducerFnSlot<T, A> {
    dispatch: Dispatch<T, A>,
}

impl<T: 'static, A: 'static> HookSlot for ReducerFnSlot<T, A> {
    fn kind(&self) -> HookKind {
        HookKind::ReducerFn
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_diff_reports_changed_added_and_removed_keys() {
        let previous = BTreeMap::from([("a", 1), ("b", 2), ("c", 3)]);
        let next = BTreeMap::from([("a", 1), ("b", 5), ("d", 4)]);
        assert_eq!(object_diff(&previous, &next), vec!["b", "c", "d"]);
        assert!(object_diff(&next, &next).is_empty());
    }

    #[test]
    fn reducer_table_counts_the_reset_command() {
        static TABLE: ReducerTable<i32, i32> = ReducerTable {
            init: || 0,
            actions: &[|value, by| value + by],
        };
        assert_eq!(TABLE.len(), 2);
    }
}
