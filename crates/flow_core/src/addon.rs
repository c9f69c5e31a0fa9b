//! Add-ons: behavior fragments attached to a node.
//!
//! Add-ons share the lifecycle and pin namespace of the node they are attached
//! to. At design time a node carries [`AddOnTemplate`]s. When the node is
//! initialized every template is cloned into the node's [`AddOns`] arena,
//! where each instance records its owning node and parent.

use crate::capability::{ContextPinSupplier, DataPinValueSupplier};
use crate::exec::ExecCtx;
use crate::graph::NodeId;
use crate::node::{EntityKind, Node};
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Index of an add-on within its node's [`AddOns`] arena.
pub type AddOnId = usize;

/// A behavior fragment attached to a node or to another add-on.
///
/// Lifecycle methods mirror those of [`Node`] and all default to doing nothing.
/// Input pins reach an add-on when it lists them among its context inputs, or
/// when it lists no inputs at all.
pub trait AddOn: Any + DynClone + DataPinValueSupplier + ContextPinSupplier {
    /// Only add-ons may be attached as add-ons.
    fn kind(&self) -> EntityKind {
        EntityKind::AddOn
    }

    /// The name of the implementing type, used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether this add-on agrees to be attached under `parent`.
    ///
    /// `others` lists add-ons to assume are already siblings.
    fn accept_add_on_parent(&self, _parent: Parent, _others: &[&dyn AddOn]) -> AcceptResult {
        AcceptResult::Undetermined
    }

    /// Whether this add-on agrees to parent `candidate`.
    fn accept_add_on_child(&self, _candidate: &dyn AddOn, _others: &[&dyn AddOn]) -> AcceptResult {
        AcceptResult::Undetermined
    }

    fn initialize_instance(&mut self, _ctx: &mut ExecCtx) {}
    fn deinitialize_instance(&mut self, _ctx: &mut ExecCtx) {}
    fn preload_content(&mut self, _ctx: &mut ExecCtx) {}
    fn flush_content(&mut self, _ctx: &mut ExecCtx) {}
    fn on_activate(&mut self, _ctx: &mut ExecCtx) {}
    fn cleanup(&mut self, _ctx: &mut ExecCtx) {}
    fn force_finish_node(&mut self, _ctx: &mut ExecCtx) {}
    fn execute_input(&mut self, _ctx: &mut ExecCtx, _pin: &str) {}
}

dyn_clone::clone_trait_object!(AddOn);

/// The outcome of an acceptance check.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum AcceptResult {
    #[default]
    Undetermined,
    Accept,
    Reject,
}

/// The prospective parent of an add-on.
#[derive(Copy, Clone)]
pub enum Parent<'a> {
    Node(&'a dyn Node),
    AddOn(&'a dyn AddOn),
}

/// Returned by the visitor of a `for_each` traversal.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum ForEachAddOn {
    Continue,
    Stop,
    StopWithError,
}

/// Whether a traversal descends into nested add-ons.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum ChildRule {
    ImmediateChildrenOnly,
    #[default]
    AllChildren,
}

/// A design-time add-on along with its nested add-ons.
#[derive(Clone)]
pub struct AddOnTemplate {
    pub add_on: Box<dyn AddOn>,
    pub children: Vec<AddOnTemplate>,
}

/// The add-on instances of a node.
#[derive(Default)]
pub struct AddOns {
    slots: Vec<Slot>,
    roots: Vec<AddOnId>,
}

struct Slot {
    add_on: Option<Box<dyn AddOn>>,
    owner: NodeId,
    parent: Option<AddOnId>,
    children: Vec<AddOnId>,
}

impl AcceptResult {
    /// `Reject` wins over everything, `Accept` wins over `Undetermined`.
    pub fn combine(self, other: Self) -> Self {
        use AcceptResult::*;
        match (self, other) {
            (Reject, _) | (_, Reject) => Reject,
            (Accept, _) | (_, Accept) => Accept,
            _ => Undetermined,
        }
    }
}

impl<'a> Parent<'a> {
    fn accept_add_on_child(&self, candidate: &dyn AddOn, others: &[&dyn AddOn]) -> AcceptResult {
        match self {
            Parent::Node(node) => node.accept_add_on_child(candidate, others),
            Parent::AddOn(add_on) => add_on.accept_add_on_child(candidate, others),
        }
    }

    /// The type name of the parent.
    pub fn type_name(&self) -> &'static str {
        match self {
            Parent::Node(node) => node.type_name(),
            Parent::AddOn(add_on) => add_on.type_name(),
        }
    }
}

impl ForEachAddOn {
    pub fn should_continue(self) -> bool {
        self == ForEachAddOn::Continue
    }
}

impl AddOnTemplate {
    pub fn new(add_on: impl AddOn) -> Self {
        AddOnTemplate {
            add_on: Box::new(add_on),
            children: vec![],
        }
    }

    /// Builder for a nested add-on.
    pub fn with_child(mut self, child: AddOnTemplate) -> Self {
        self.children.push(child);
        self
    }
}

impl AddOns {
    /// Clone every template, depth-first, into a new arena.
    pub(crate) fn instantiate(owner: NodeId, templates: &[AddOnTemplate]) -> Self {
        let mut add_ons = AddOns::default();
        for template in templates {
            let id = add_ons.push(owner, None, template);
            add_ons.roots.push(id);
        }
        add_ons
    }

    fn push(&mut self, owner: NodeId, parent: Option<AddOnId>, template: &AddOnTemplate) -> AddOnId {
        let id = self.slots.len();
        self.slots.push(Slot {
            add_on: Some(dyn_clone::clone_box(&*template.add_on)),
            owner,
            parent,
            children: vec![],
        });
        for child in &template.children {
            let child_id = self.push(owner, Some(id), child);
            self.slots[id].children.push(child_id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The add-on instance, unless it is detached for a lifecycle call.
    pub fn get(&self, id: AddOnId) -> Option<&dyn AddOn> {
        self.slots.get(id)?.add_on.as_deref()
    }

    /// Downcast an add-on to its concrete type.
    pub fn get_as<T: AddOn>(&self, id: AddOnId) -> Option<&T> {
        (self.get(id)? as &dyn Any).downcast_ref::<T>()
    }

    /// The node owning the add-on.
    pub fn owner(&self, id: AddOnId) -> Option<NodeId> {
        self.slots.get(id).map(|slot| slot.owner)
    }

    /// The add-on this add-on is nested in, if any.
    pub fn parent(&self, id: AddOnId) -> Option<AddOnId> {
        self.slots.get(id)?.parent
    }

    pub fn children(&self, id: AddOnId) -> &[AddOnId] {
        self.slots
            .get(id)
            .map(|slot| &slot.children[..])
            .unwrap_or(&[])
    }

    /// The add-ons attached directly to the node.
    pub fn roots(&self) -> &[AddOnId] {
        &self.roots
    }

    /// Parents before children, siblings in attachment order.
    pub fn pre_order(&self) -> Vec<AddOnId> {
        let mut order = Vec::with_capacity(self.slots.len());
        for &root in &self.roots {
            self.pre_order_from(root, &mut order);
        }
        order
    }

    /// Children before parents, siblings in attachment order.
    pub fn post_order(&self) -> Vec<AddOnId> {
        let mut order = Vec::with_capacity(self.slots.len());
        for &root in &self.roots {
            self.post_order_from(root, &mut order);
        }
        order
    }

    fn pre_order_from(&self, id: AddOnId, order: &mut Vec<AddOnId>) {
        order.push(id);
        for &child in self.children(id) {
            self.pre_order_from(child, order);
        }
    }

    fn post_order_from(&self, id: AddOnId, order: &mut Vec<AddOnId>) {
        for &child in self.children(id) {
            self.post_order_from(child, order);
        }
        order.push(id);
    }

    /// Visit the add-ons attached to the node.
    ///
    /// Visiting stops as soon as `f` returns anything other than `Continue`,
    /// and that value is returned.
    pub fn for_each<F>(&self, rule: ChildRule, mut f: F) -> ForEachAddOn
    where
        F: FnMut(AddOnId, &dyn AddOn) -> ForEachAddOn,
    {
        self.visit(&self.roots, rule, &mut |_| true, &mut f)
    }

    /// Visit only the add-ons of type `T`, still descending through add-ons of
    /// other types.
    pub fn for_each_of<T, F>(&self, rule: ChildRule, mut f: F) -> ForEachAddOn
    where
        T: AddOn,
        F: FnMut(AddOnId, &T) -> ForEachAddOn,
    {
        let mut is_t = |add_on: &dyn AddOn| (add_on as &dyn Any).is::<T>();
        self.visit(&self.roots, rule, &mut is_t, &mut |id, add_on| {
            match (add_on as &dyn Any).downcast_ref::<T>() {
                Some(t) => f(id, t),
                None => ForEachAddOn::Continue,
            }
        })
    }

    fn visit(
        &self,
        ids: &[AddOnId],
        rule: ChildRule,
        filter: &mut dyn FnMut(&dyn AddOn) -> bool,
        f: &mut dyn FnMut(AddOnId, &dyn AddOn) -> ForEachAddOn,
    ) -> ForEachAddOn {
        let mut result = ForEachAddOn::Continue;
        for &id in ids {
            let Some(add_on) = self.get(id) else {
                continue;
            };
            if filter(add_on) {
                result = f(id, add_on);
                if !result.should_continue() {
                    break;
                }
            }
            if rule == ChildRule::AllChildren {
                result = self.visit(self.children(id), rule, filter, f);
                if !result.should_continue() {
                    break;
                }
            }
        }
        result
    }

    pub(crate) fn take(&mut self, id: AddOnId) -> Option<Box<dyn AddOn>> {
        self.slots.get_mut(id)?.add_on.take()
    }

    pub(crate) fn restore(&mut self, id: AddOnId, add_on: Box<dyn AddOn>) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.add_on = Some(add_on);
        }
    }
}

/// Check whether `candidate` may be attached under `parent`.
///
/// The parent is asked first and a rejection ends the check. Otherwise the
/// candidate is asked, and the two answers are combined. Candidates of the
/// node kind are always rejected.
pub fn check_accept_add_on_child(
    parent: Parent,
    candidate: &dyn AddOn,
    others: &[&dyn AddOn],
) -> AcceptResult {
    let as_child = parent.accept_add_on_child(candidate, others);
    if as_child == AcceptResult::Reject {
        return AcceptResult::Reject;
    }

    let as_parent = candidate.accept_add_on_parent(parent, others);
    if candidate.kind() == EntityKind::Node {
        if as_parent != AcceptResult::Reject {
            log::error!(
                "{}::accept_add_on_parent must always reject for node types",
                candidate.type_name(),
            );
        }
        return AcceptResult::Reject;
    }

    as_child.combine(as_parent)
}

/// The context pins contributed by a tree of templates, in pre-order.
pub(crate) fn template_context_pins(
    templates: &[AddOnTemplate],
    inputs: &mut Vec<crate::pin::Pin>,
    outputs: &mut Vec<crate::pin::Pin>,
) {
    for template in templates {
        inputs.extend(template.add_on.context_inputs());
        outputs.extend(template.add_on.context_outputs());
        template_context_pins(&template.children, inputs, outputs);
    }
}

impl fmt::Debug for AddOnTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AddOnTemplate")
            .field("add_on", &self.add_on.type_name())
            .field("children", &self.children)
            .finish()
    }
}

impl fmt::Debug for AddOns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<_> = (0..self.slots.len())
            .map(|id| self.get(id).map(|a| a.type_name()))
            .collect();
        f.debug_struct("AddOns")
            .field("add_ons", &names)
            .field("roots", &self.roots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_reject_is_absorbing() {
        use AcceptResult::*;
        assert_eq!(Reject.combine(Accept), Reject);
        assert_eq!(Accept.combine(Reject), Reject);
        assert_eq!(Undetermined.combine(Reject), Reject);
        assert_eq!(Accept.combine(Undetermined), Accept);
        assert_eq!(Undetermined.combine(Accept), Accept);
        assert_eq!(Undetermined.combine(Undetermined), Undetermined);
    }
}
