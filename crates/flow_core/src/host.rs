//! The services a graph instance exposes to the entities it drives.

use crate::graph::NodeId;
use crate::world::{ActorId, SimpleWorld, World};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// World access, the owning actor and diagnostics, passed explicitly to every
/// lifecycle call in place of global engine state.
pub struct HostServices {
    world: Box<dyn World>,
    owner: Option<ActorId>,
    messages: MessageLog,
}

/// Severity of a diagnostic message.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A diagnostic raised by a node, add-on or the graph itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub severity: Severity,
    pub node: Option<NodeId>,
    pub text: String,
}

/// The diagnostics recorded during the lifetime of a graph instance.
#[derive(Clone, Debug)]
pub struct MessageLog {
    messages: Vec<Message>,
    enabled: bool,
}

impl HostServices {
    pub fn new(world: impl World) -> Self {
        HostServices {
            world: Box::new(world),
            owner: None,
            messages: MessageLog::default(),
        }
    }

    /// Builder for the actor owning the graph instance.
    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn world(&self) -> &dyn World {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut dyn World {
        &mut *self.world
    }

    /// Downcast the world to its concrete type.
    pub fn world_as<W: World>(&self) -> Option<&W> {
        (&*self.world as &dyn Any).downcast_ref::<W>()
    }

    /// Mutable variant of [`HostServices::world_as`].
    pub fn world_as_mut<W: World>(&mut self) -> Option<&mut W> {
        (&mut *self.world as &mut dyn Any).downcast_mut::<W>()
    }

    /// The actor owning the graph instance, if any.
    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<ActorId>) {
        self.owner = owner;
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageLog {
        &mut self.messages
    }

    /// Emit a diagnostic through `log` and record it in the message log.
    pub fn log(&mut self, severity: Severity, node: Option<NodeId>, text: impl fmt::Display) {
        let text = match node {
            Some(node) => format!("{text} --- node {}", node.index()),
            None => text.to_string(),
        };
        match severity {
            Severity::Error => log::error!("{text}"),
            Severity::Warning => log::warn!("{text}"),
            Severity::Note => log::info!("{text}"),
        }
        self.messages.push(Message {
            severity,
            node,
            text,
        });
    }
}

impl MessageLog {
    /// Record the message, unless recording is disabled.
    pub fn push(&mut self, message: Message) {
        if self.enabled {
            self.messages.push(message);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// All messages of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Message> {
        self.iter().filter(move |m| m.severity == severity)
    }

    /// All messages raised for the given node.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Message> {
        self.iter().filter(move |m| m.node == Some(node))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for HostServices {
    fn default() -> Self {
        Self::new(SimpleWorld::default())
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        MessageLog {
            messages: vec![],
            enabled: true,
        }
    }
}
