//! Host elements: the one built-in component that owns a target node.

use std::collections::BTreeMap;

use crate::call::{Call, Children, HasChildren, Render, RenderResult, tagged_node};
use crate::error::Error;
use crate::hooks::Cx;
use crate::target::{AttrValue, NodeId};

/// Everything an element forwards to its node. Only entries that changed
/// since the previous render reach the target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    pub attrs: BTreeMap<String, AttrValue>,
    /// Class names and whether each is active.
    pub flags: BTreeMap<String, bool>,
    pub style: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn flag(mut self, class: impl Into<String>, active: bool) -> Self {
        self.flags.insert(class.into(), active);
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Active flags, space separated, in name order.
    pub fn classes(&self) -> String {
        self.flags
            .iter()
            .filter(|(_, active)| **active)
            .map(|(class, _)| class.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementProps {
    pub tag: &'static str,
    pub attributes: Attributes,
    /// `None` renders no child list at all.
    pub children: Option<Children>,
}

impl HasChildren for ElementProps {
    fn set_children(&mut self, children: Children) {
        self.children = Some(children);
    }
}

impl ElementProps {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes = self.attributes.attr(name, value);
        self
    }

    pub fn flag(mut self, class: impl Into<String>, active: bool) -> Self {
        self.attributes = self.attributes.flag(class, active);
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.style(property, value);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Option<Call>>) -> Self {
        self.children = Some(children.into_iter().collect());
        self
    }

    pub fn call(self) -> Call {
        let tag = self.tag;
        tagged_node(element, self, tag)
    }
}

impl From<ElementProps> for Call {
    fn from(props: ElementProps) -> Self {
        props.call()
    }
}

/// Starts an element description.
///
/// ```rust,ignore
/// el("button")
///     .attr("type", "submit")
///     .flag("primary", true)
///     .children([Some(el("span").call())])
///     .call()
/// ```
pub fn el(tag: &'static str) -> ElementProps {
    ElementProps {
        tag,
        attributes: Attributes::default(),
        children: None,
    }
}

/// Host component for [`ElementProps`].
pub fn element(cx: &mut Cx<'_>, props: &ElementProps) -> RenderResult {
    let tag = props.tag;
    let node = cx.own_node(|target| target.create_element(tag));
    apply_attributes(cx, node, &props.attributes)?;
    Ok(match &props.children {
        Some(children) => Render::Children(children.clone()),
        None => Render::Empty,
    })
}

pub(crate) fn apply_attributes(
    cx: &mut Cx<'_>,
    node: NodeId,
    attributes: &Attributes,
) -> Result<(), Error> {
    for name in cx.object_changes(&attributes.attrs)? {
        cx.target()
            .set_attribute(node, &name, attributes.attrs.get(&name));
    }
    if !cx.object_changes(&attributes.flags)?.is_empty() {
        cx.target().set_classes(node, &attributes.classes());
    }
    for property in cx.object_changes(&attributes.style)? {
        cx.target().set_style(
            node,
            &property,
            attributes.style.get(&property).map(String::as_str),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_attributes() {
        let props = el("div")
            .attr("id", "main")
            .flag("active", true)
            .flag("hidden", false)
            .style("color", "red");
        assert_eq!(props.attributes.attrs.get("id"), Some(&AttrValue::from("main")));
        assert_eq!(props.attributes.classes(), "active");
        assert_eq!(props.attributes.style.get("color").map(String::as_str), Some("red"));
        assert!(props.children.is_none());
    }

    #[test]
    fn element_calls_compare_by_description() {
        let a = el("p").attr("title", "x").call();
        let b = el("p").attr("title", "x").call();
        let c = el("p").attr("title", "y").call();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "p");
        assert_ne!(a.component_id(), el("div").call().component_id());
    }
}
