//! Call descriptors: what a component asks to have mounted at a position.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::hooks::Cx;
use crate::keyed::ListSource;

/// Child list returned by a component. `None` keeps a position empty while
/// preserving the indices of its siblings.
pub type Children = Vec<Option<Call>>;

pub enum Render {
    Children(Children),
    /// No child list at all; existing children are unmounted.
    Empty,
    /// Skip this instance's subtree for this render, leaving it as it was.
    /// Not an error: the rest of the pass is unaffected.
    Abort,
}

impl Render {
    pub fn children(children: impl IntoIterator<Item = Option<Call>>) -> Self {
        Render::Children(children.into_iter().collect())
    }
}

impl From<Children> for Render {
    fn from(children: Children) -> Self {
        Render::Children(children)
    }
}

pub type RenderResult = Result<Render, Error>;

/// Identity of a component. Two calls target the same component exactly when
/// their component function items are the same item and, for host elements,
/// the tags match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(TypeId, Option<&'static str>);

impl ComponentId {
    pub fn of<F: 'static>() -> Self {
        ComponentId(TypeId::of::<F>(), None)
    }

    pub fn tagged<F: 'static>(tag: &'static str) -> Self {
        ComponentId(TypeId::of::<F>(), Some(tag))
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.1
    }
}

pub(crate) trait AnyCall {
    fn component_id(&self) -> ComponentId;
    fn name(&self) -> &'static str;
    fn props(&self) -> &dyn Any;
    fn props_eq(&self, other: &dyn AnyCall) -> bool;
    fn invoke(&self, cx: &mut Cx<'_>) -> RenderResult;
    fn list(&self) -> Option<&dyn ListSource> {
        None
    }
}

#[derive(Clone)]
pub struct Call(pub(crate) Rc<dyn AnyCall>);

impl Call {
    pub fn component_id(&self) -> ComponentId {
        self.0.component_id()
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Typed view of the properties, if they are a `P`.
    pub fn props<P: 'static>(&self) -> Option<&P> {
        self.0.props().downcast_ref::<P>()
    }

    pub fn is_list(&self) -> bool {
        self.0.list().is_some()
    }

    pub(crate) fn same_component(&self, other: &Call) -> bool {
        self.component_id() == other.component_id()
    }

    pub(crate) fn invoke(&self, cx: &mut Cx<'_>) -> RenderResult {
        self.0.invoke(cx)
    }

    pub(crate) fn list(&self) -> Option<&dyn ListSource> {
        self.0.list()
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.same_component(other) && self.0.props_eq(other.0.as_ref()))
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Call").field(&self.name()).finish()
    }
}

struct ComponentCall<F, P> {
    component: F,
    props: P,
    tag: Option<&'static str>,
}

impl<F, P> AnyCall for ComponentCall<F, P>
where
    F: Fn(&mut Cx<'_>, &P) -> RenderResult + Copy + 'static,
    P: PartialEq + 'static,
{
    fn component_id(&self) -> ComponentId {
        match self.tag {
            Some(tag) => ComponentId::tagged::<F>(tag),
            None => ComponentId::of::<F>(),
        }
    }

    fn name(&self) -> &'static str {
        self.tag.unwrap_or_else(|| short_name(type_name::<F>()))
    }

    fn props(&self) -> &dyn Any {
        &self.props
    }

    fn props_eq(&self, other: &dyn AnyCall) -> bool {
        other
            .props()
            .downcast_ref::<P>()
            .is_some_and(|props| *props == self.props)
    }

    fn invoke(&self, cx: &mut Cx<'_>) -> RenderResult {
        (self.component)(cx, &self.props)
    }
}

/// Builds a call of `component` with `props`.
///
/// `component` should be a function item: its type is its identity, so a
/// closure capturing state would be compared without its captures.
pub fn node<F, P>(component: F, props: P) -> Call
where
    F: Fn(&mut Cx<'_>, &P) -> RenderResult + Copy + 'static,
    P: PartialEq + 'static,
{
    Call(Rc::new(ComponentCall {
        component,
        props,
        tag: None,
    }))
}

/// Like [`node`], with `tag` as part of the component identity.
pub(crate) fn tagged_node<F, P>(component: F, props: P, tag: &'static str) -> Call
where
    F: Fn(&mut Cx<'_>, &P) -> RenderResult + Copy + 'static,
    P: PartialEq + 'static,
{
    Call(Rc::new(ComponentCall {
        component,
        props,
        tag: Some(tag),
    }))
}

/// Properties that can carry a child list.
pub trait HasChildren {
    fn set_children(&mut self, children: Children);
}

pub fn node_with_children<F, P>(component: F, mut props: P, children: Children) -> Call
where
    F: Fn(&mut Cx<'_>, &P) -> RenderResult + Copy + 'static,
    P: PartialEq + HasChildren + 'static,
{
    props.set_children(children);
    node(component, props)
}

pub(crate) fn short_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(_cx: &mut Cx<'_>, _props: &u32) -> RenderResult {
        Ok(Render::Empty)
    }

    fn other(_cx: &mut Cx<'_>, _props: &u32) -> RenderResult {
        Ok(Render::Empty)
    }

    #[test]
    fn calls_compare_by_component_and_props() {
        assert_eq!(node(plain, 1), node(plain, 1));
        assert_ne!(node(plain, 1), node(plain, 2));
        assert_ne!(node(plain, 1), node(other, 1));
    }

    #[test]
    fn names_come_from_the_function_item() {
        assert_eq!(node(plain, 0).name(), "plain");
        assert_eq!(short_name("a::b::Thing<c::D>"), "Thing");
    }

    #[test]
    fn typed_props_are_reachable() {
        let call = node(plain, 7u32);
        assert_eq!(call.props::<u32>(), Some(&7));
        assert_eq!(call.props::<i64>(), None);
        assert!(!call.is_list());
    }
}
