//! Tracks components injected into actors on behalf of a node.

use crate::world::{ActorId, Component, ComponentClass, ComponentId, World};

/// Instantiates components onto actors and removes them again on shutdown.
///
/// Only components created through the manager are removed. Components that
/// were found on the actor and reused are left untouched.
#[derive(Clone, Debug, Default)]
pub struct InjectComponentsManager {
    injected: Vec<ComponentId>,
}

impl InjectComponentsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a copy of `template` to `actor`.
    pub fn inject_from_template(
        &mut self,
        world: &mut dyn World,
        actor: ActorId,
        template: &dyn Component,
    ) -> Option<ComponentId> {
        let id = world.spawn_component_from_template(actor, template)?;
        self.injected.push(id);
        Some(id)
    }

    /// Attach a new instance of `class` to `actor`.
    pub fn inject_from_class(
        &mut self,
        world: &mut dyn World,
        actor: ActorId,
        class: &ComponentClass,
    ) -> Option<ComponentId> {
        let id = world.spawn_component_from_class(actor, class)?;
        self.injected.push(id);
        Some(id)
    }

    /// The components injected so far.
    pub fn injected(&self) -> &[ComponentId] {
        &self.injected
    }

    /// Remove every injected component from the world.
    pub fn shutdown(&mut self, world: &mut dyn World) {
        for id in self.injected.drain(..) {
            if world.remove_component(id) {
                log::debug!("removed injected component {}", id.0);
            }
        }
    }
}
