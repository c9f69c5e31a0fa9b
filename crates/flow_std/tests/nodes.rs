// Tests for the standard nodes.

use flow_core::value::{GameplayTag, GameplayTagContainer};
use flow_core::{
    ActivationState, DataPinResolveResult, DataPinValueSupplier, ExecCtx, GraphInstance,
    HostServices, Node, Pin, PinType, Severity, SimpleWorld,
};
use flow_std::{Constant, Log, NotifyActor, Reroute};
use std::cell::Cell;
use std::rc::Rc;

// Counts the executions of its `In` pin.
struct Listener(Rc<Cell<usize>>);

// A node with a single input of the given type named `Value`.
struct Sink(PinType);

impl DataPinValueSupplier for Listener {}
impl Node for Listener {
    fn execute_input(&mut self, _ctx: &mut ExecCtx, _pin: &str) {
        self.0.set(self.0.get() + 1);
    }
}

impl DataPinValueSupplier for Sink {}
impl Node for Sink {
    fn input_pins(&self) -> Vec<Pin> {
        vec![Pin::new("Value", self.0)]
    }
}

fn listener(g: &mut GraphInstance) -> (flow_core::NodeId, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    let id = g.add_node(Listener(count.clone()));
    (id, count)
}

fn tags(names: &[&str]) -> GameplayTagContainer {
    names.iter().map(|n| GameplayTag::new(*n)).collect()
}

#[test]
fn test_reroute_passes_through() {
    let mut g = GraphInstance::default();
    let a = g.add_node(Reroute);
    let b = g.add_node(Reroute);
    let (p, count) = listener(&mut g);
    g.connect(a, "Out", b, "In").unwrap();
    g.connect(b, "Out", p, "In").unwrap();
    g.initialize().unwrap();

    g.trigger_input(a, "In").unwrap();
    g.trigger_input(a, "In").unwrap();
    assert_eq!(count.get(), 2);
    assert_eq!(g.activation_state(a), Some(ActivationState::Active));
    assert_eq!(g.node(a).unwrap().title(), "Reroute");
}

#[test]
fn test_log_message_default_and_connected() {
    let mut g = GraphInstance::default();
    let log = g.add_node(Log::new(log::Level::Info, "fallback"));
    assert_eq!(g.resolve::<String>(log, "Message").into_value().as_deref(), Some("fallback"));

    let c = g.add_node(Constant::new(String::from("hello")));
    g.connect(c, "Value", log, "Message").unwrap();
    assert_eq!(g.resolve::<String>(log, "Message").into_value().as_deref(), Some("hello"));
}

#[test]
fn test_log_passes_execution_through() {
    let _ = env_logger::try_init();
    let mut g = GraphInstance::default();
    let log = g.add_node(Log::new(log::Level::Debug, "hello"));
    let (p, count) = listener(&mut g);
    g.connect(log, "Out", p, "In").unwrap();
    g.initialize().unwrap();

    g.trigger_input(log, "In").unwrap();
    assert_eq!(count.get(), 1);
    assert!(g.host().messages().is_empty());
}

#[test]
fn test_log_ignores_mismatched_connection() {
    let mut g = GraphInstance::default();
    let log = g.add_node(Log::new(log::Level::Info, "fallback"));
    let c = g.add_node(Constant::new(3i64));
    g.connect(c, "Value", log, "Message").unwrap();
    assert_eq!(g.resolve::<String>(log, "Message").into_value().as_deref(), Some("fallback"));
}

#[test]
fn test_constant() {
    let mut g = GraphInstance::default();
    let c = g.add_node(Constant::new(1.25));
    let float = g.add_node(Sink(PinType::Float));
    let int = g.add_node(Sink(PinType::Int));
    g.connect(c, "Value", float, "Value").unwrap();
    g.connect(c, "Value", int, "Value").unwrap();

    assert_eq!(g.resolve::<f64>(float, "Value").into_value(), Some(1.25));
    assert_eq!(
        g.resolve::<i64>(int, "Value").result(),
        DataPinResolveResult::FailedMismatchedType
    );
    let outputs: Vec<_> = g.output_pins(c).unwrap().iter().map(|p| p.pin_type).collect();
    assert_eq!(outputs, [PinType::Float]);

    // Declaring no inputs leaves the default exec input, contributed as context.
    let inputs = g.input_pins(c).unwrap();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].name, "In");
    assert_eq!(inputs[0].pin_type, PinType::Exec);
    assert!(inputs[0].context);
}

// A world with a red actor, a red leader and a blue actor.
fn teams() -> (SimpleWorld, [flow_core::ActorId; 3]) {
    let mut world = SimpleWorld::new();
    let red = world.spawn_actor_with_tags("Red", tags(&["Team.Red"]));
    let leader = world.spawn_actor_with_tags("Leader", tags(&["Team.Red.Leader"]));
    let blue = world.spawn_actor_with_tags("Blue", tags(&["Team.Blue"]));
    (world, [red, leader, blue])
}

#[test]
fn test_notify_actor() {
    let (world, [red, leader, blue]) = teams();
    let mut g = GraphInstance::new(HostServices::new(world));
    let notify = g.add_node(NotifyActor::new(tags(&["Team.Red"]), GameplayTag::new("Alarm")));
    let (p, count) = listener(&mut g);
    g.connect(notify, "Out", p, "In").unwrap();
    g.initialize().unwrap();

    g.trigger_input(notify, "In").unwrap();
    let world = g.host().world_as::<SimpleWorld>().unwrap();
    assert_eq!(world.notifications(red), [GameplayTag::new("Alarm")]);
    assert_eq!(world.notifications(leader), [GameplayTag::new("Alarm")]);
    assert!(world.notifications(blue).is_empty());
    assert_eq!(g.activation_state(notify), Some(ActivationState::Completed));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_notify_tag_from_connection() {
    let (world, [red, _, blue]) = teams();
    let mut g = GraphInstance::new(HostServices::new(world));
    let notify = g.add_node(NotifyActor::new(tags(&["Team"]), GameplayTag::new("Alarm")));
    let c = g.add_node(Constant::new(GameplayTag::new("Retreat")));
    g.connect(c, "Value", notify, "Notify Tag").unwrap();
    g.initialize().unwrap();

    g.trigger_input(notify, "In").unwrap();
    let world = g.host().world_as::<SimpleWorld>().unwrap();
    assert_eq!(world.notifications(red), [GameplayTag::new("Retreat")]);
    assert_eq!(world.notifications(blue), [GameplayTag::new("Retreat")]);
}

#[test]
fn test_notify_without_tag_still_finishes() {
    let _ = env_logger::try_init();
    let (world, [red, _, _]) = teams();
    let mut g = GraphInstance::new(HostServices::new(world));
    let notify = g.add_node(NotifyActor::new(tags(&["Team.Red"]), GameplayTag::default()));
    g.initialize().unwrap();

    g.trigger_input(notify, "In").unwrap();
    let world = g.host().world_as::<SimpleWorld>().unwrap();
    assert!(world.notifications(red).is_empty());
    assert_eq!(g.activation_state(notify), Some(ActivationState::Completed));
    let errors: Vec<_> = g
        .host()
        .messages()
        .with_severity(Severity::Error)
        .map(|m| m.text.clone())
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("no valid notify tag to send"));
}

#[test]
fn test_nodes_serialize() {
    let node = Log::new(log::Level::Warn, "careful");
    let json = serde_json::to_string(&node).unwrap();
    assert_eq!(serde_json::from_str::<Log>(&json).unwrap(), node);

    let node = NotifyActor::new(tags(&["A.B"]), GameplayTag::new("C"));
    let json = serde_json::to_string(&node).unwrap();
    assert_eq!(serde_json::from_str::<NotifyActor>(&json).unwrap(), node);
}
