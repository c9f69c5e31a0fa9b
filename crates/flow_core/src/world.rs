//! The actor/component world a graph instance runs in.
//!
//! The [`World`] trait is the boundary to whatever owns actors and their
//! components. [`SimpleWorld`] is a small in-memory implementation.

use crate::capability::{ContextPinSupplier, CoreExecutable, DataPinValueSupplier, ExternalExecutable};
use crate::value::{GameplayTag, GameplayTagContainer};
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Identifies an actor within a world.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct ActorId(pub usize);

/// Identifies a component within a world.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct ComponentId(pub usize);

/// The class of a component, by name.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct ComponentClass(pub String);

/// An object attached to an actor.
///
/// Components opt into the capabilities the proxy node drives by returning
/// `Some` from the matching accessor.
pub trait Component: Any + DynClone {
    /// The class this component is an instance of.
    fn class(&self) -> ComponentClass;

    fn as_core_executable(&mut self) -> Option<&mut dyn CoreExecutable> {
        None
    }

    fn as_external_executable(&mut self) -> Option<&mut dyn ExternalExecutable> {
        None
    }

    fn as_data_pin_supplier(&self) -> Option<&dyn DataPinValueSupplier> {
        None
    }

    fn as_context_pin_supplier(&self) -> Option<&dyn ContextPinSupplier> {
        None
    }
}

dyn_clone::clone_trait_object!(Component);

/// Resolves and instantiates components on actors.
pub trait World: Any {
    fn component(&self, id: ComponentId) -> Option<&dyn Component>;

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component>;

    /// The name the component is registered under on its actor.
    fn component_name(&self, id: ComponentId) -> Option<&str>;

    /// Find a component on `actor` by name.
    fn find_component_by_name(&self, actor: ActorId, name: &str) -> Option<ComponentId>;

    /// Find the first component on `actor` of the given class.
    fn find_component_by_class(&self, actor: ActorId, class: &ComponentClass)
    -> Option<ComponentId>;

    /// The default instance of a class, used to inspect a class before any
    /// instance exists.
    fn class_default(&self, class: &ComponentClass) -> Option<&dyn Component>;

    /// Attach a copy of `template` to `actor`.
    fn spawn_component_from_template(
        &mut self,
        actor: ActorId,
        template: &dyn Component,
    ) -> Option<ComponentId>;

    /// Attach a new instance of `class` to `actor`.
    fn spawn_component_from_class(
        &mut self,
        actor: ActorId,
        class: &ComponentClass,
    ) -> Option<ComponentId>;

    /// Detach and destroy a component. Returns `false` if it did not exist.
    fn remove_component(&mut self, id: ComponentId) -> bool;

    /// All actors carrying any of the given identity tags.
    fn actors_with_tags(&self, _tags: &GameplayTagContainer) -> Vec<ActorId> {
        vec![]
    }

    /// Deliver a notification raised by a graph to an actor.
    fn notify_actor(&mut self, _actor: ActorId, _tag: &GameplayTag) {}
}

/// An in-memory world of actors and components.
#[derive(Default)]
pub struct SimpleWorld {
    actors: Vec<Actor>,
    components: Vec<Option<ComponentSlot>>,
    classes: BTreeMap<ComponentClass, Box<dyn Component>>,
    spawned: usize,
}

struct Actor {
    name: String,
    tags: GameplayTagContainer,
    components: Vec<ComponentId>,
    notifications: Vec<GameplayTag>,
}

struct ComponentSlot {
    name: String,
    owner: ActorId,
    component: Box<dyn Component>,
}

impl ComponentClass {
    pub fn new(name: impl Into<String>) -> Self {
        ComponentClass(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The class name without the generated-class `_C` suffix.
    pub fn display_name(&self) -> &str {
        self.0.strip_suffix("_C").unwrap_or(&self.0)
    }
}

impl SimpleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_actor(&mut self, name: impl Into<String>) -> ActorId {
        self.spawn_actor_with_tags(name, GameplayTagContainer::new())
    }

    /// Spawn an actor carrying the given identity tags.
    pub fn spawn_actor_with_tags(
        &mut self,
        name: impl Into<String>,
        tags: GameplayTagContainer,
    ) -> ActorId {
        let id = ActorId(self.actors.len());
        self.actors.push(Actor {
            name: name.into(),
            tags,
            components: vec![],
            notifications: vec![],
        });
        id
    }

    pub fn actor_name(&self, actor: ActorId) -> Option<&str> {
        self.actors.get(actor.0).map(|a| &a.name[..])
    }

    /// Attach a component to an actor under the given name.
    pub fn add_component(
        &mut self,
        actor: ActorId,
        name: impl Into<String>,
        component: impl Component,
    ) -> Option<ComponentId> {
        self.insert(actor, name.into(), Box::new(component))
    }

    /// Register the default instance used to spawn components of its class.
    pub fn register_class(&mut self, class_default: impl Component) {
        self.classes
            .insert(class_default.class(), Box::new(class_default));
    }

    /// The components currently attached to `actor`.
    pub fn actor_components(&self, actor: ActorId) -> &[ComponentId] {
        self.actors
            .get(actor.0)
            .map(|a| &a.components[..])
            .unwrap_or(&[])
    }

    /// Downcast a component to its concrete type.
    pub fn component_as<C: Component>(&self, id: ComponentId) -> Option<&C> {
        let component = self.component(id)?;
        (component as &dyn Any).downcast_ref::<C>()
    }

    /// The number of components created by the `spawn_component_*` methods.
    pub fn spawned_count(&self) -> usize {
        self.spawned
    }

    /// Notifications delivered to `actor`, in order of arrival.
    pub fn notifications(&self, actor: ActorId) -> &[GameplayTag] {
        self.actors
            .get(actor.0)
            .map(|a| &a.notifications[..])
            .unwrap_or(&[])
    }

    fn insert(
        &mut self,
        actor: ActorId,
        name: String,
        component: Box<dyn Component>,
    ) -> Option<ComponentId> {
        let entry = self.actors.get_mut(actor.0)?;
        let id = ComponentId(self.components.len());
        entry.components.push(id);
        self.components.push(Some(ComponentSlot {
            name,
            owner: actor,
            component,
        }));
        Some(id)
    }

    fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.components.get(id.0).and_then(Option::as_ref)
    }

    fn unique_name(&self, actor: ActorId, base: &str) -> String {
        let mut n = 0;
        loop {
            let name = format!("{base}_{n}");
            if self.find_component_by_name(actor, &name).is_none() {
                return name;
            }
            n += 1;
        }
    }
}

impl World for SimpleWorld {
    fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slot(id).map(|slot| &*slot.component)
    }

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        let slot = self.components.get_mut(id.0)?.as_mut()?;
        Some(&mut *slot.component)
    }

    fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.slot(id).map(|slot| &slot.name[..])
    }

    fn find_component_by_name(&self, actor: ActorId, name: &str) -> Option<ComponentId> {
        self.actor_components(actor)
            .iter()
            .copied()
            .find(|&id| self.slot(id).is_some_and(|slot| slot.name == name))
    }

    fn find_component_by_class(
        &self,
        actor: ActorId,
        class: &ComponentClass,
    ) -> Option<ComponentId> {
        self.actor_components(actor)
            .iter()
            .copied()
            .find(|&id| self.slot(id).is_some_and(|slot| slot.component.class() == *class))
    }

    fn class_default(&self, class: &ComponentClass) -> Option<&dyn Component> {
        self.classes.get(class).map(|c| &**c)
    }

    fn spawn_component_from_template(
        &mut self,
        actor: ActorId,
        template: &dyn Component,
    ) -> Option<ComponentId> {
        let class = template.class();
        let name = self.unique_name(actor, class.display_name());
        let id = self.insert(actor, name, dyn_clone::clone_box(template))?;
        self.spawned += 1;
        Some(id)
    }

    fn spawn_component_from_class(
        &mut self,
        actor: ActorId,
        class: &ComponentClass,
    ) -> Option<ComponentId> {
        let component = dyn_clone::clone_box(&**self.classes.get(class)?);
        let name = self.unique_name(actor, class.display_name());
        let id = self.insert(actor, name, component)?;
        self.spawned += 1;
        Some(id)
    }

    fn remove_component(&mut self, id: ComponentId) -> bool {
        let Some(slot) = self.components.get_mut(id.0).and_then(Option::take) else {
            return false;
        };
        if let Some(actor) = self.actors.get_mut(slot.owner.0) {
            actor.components.retain(|&c| c != id);
        }
        true
    }

    fn actors_with_tags(&self, tags: &GameplayTagContainer) -> Vec<ActorId> {
        self.actors
            .iter()
            .enumerate()
            .filter(|(_, actor)| actor.tags.has_any(tags))
            .map(|(ix, _)| ActorId(ix))
            .collect()
    }

    fn notify_actor(&mut self, actor: ActorId, tag: &GameplayTag) {
        if let Some(actor) = self.actors.get_mut(actor.0) {
            actor.notifications.push(tag.clone());
        }
    }
}

impl fmt::Debug for SimpleWorld {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SimpleWorld")
            .field("actors", &self.actors.len())
            .field("components", &self.components.iter().flatten().count())
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}
