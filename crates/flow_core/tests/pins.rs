// Tests for the effective pin sets of nodes.

use flow_core::{
    AddOn, AddOnTemplate, ContextPinSupplier, DataPinValueSupplier, GraphInstance, HostServices,
    Node, Pin, PinType,
};
use std::cell::Cell;
use std::rc::Rc;

// Declares nothing and contributes nothing.
struct Empty;

// Declares nothing, and contributes `Go` and `Done` while `enabled` is set.
struct Switchable {
    enabled: Rc<Cell<bool>>,
}

// Declares `In`, contributes `In` and `Extra` as context.
struct Overlapping;

// An add-on contributing `Tick` and `Ticked`.
#[derive(Clone)]
struct Ticker;

impl DataPinValueSupplier for Empty {}
impl DataPinValueSupplier for Switchable {}
impl DataPinValueSupplier for Overlapping {}
impl DataPinValueSupplier for Ticker {}

impl Node for Empty {
    fn input_pins(&self) -> Vec<Pin> {
        vec![]
    }
    fn output_pins(&self) -> Vec<Pin> {
        vec![]
    }
}

impl Node for Switchable {
    fn input_pins(&self) -> Vec<Pin> {
        vec![]
    }
    fn output_pins(&self) -> Vec<Pin> {
        vec![]
    }
    fn context_inputs(&self, _host: &HostServices) -> Vec<Pin> {
        match self.enabled.get() {
            true => vec![Pin::exec("Go")],
            false => vec![],
        }
    }
    fn context_outputs(&self, _host: &HostServices) -> Vec<Pin> {
        match self.enabled.get() {
            true => vec![Pin::exec("Done")],
            false => vec![],
        }
    }
}

impl Node for Overlapping {
    fn context_inputs(&self, _host: &HostServices) -> Vec<Pin> {
        vec![Pin::exec("In"), Pin::new("Extra", PinType::Bool)]
    }
}

impl ContextPinSupplier for Ticker {
    fn context_inputs(&self) -> Vec<Pin> {
        vec![Pin::exec("Tick")]
    }
    fn context_outputs(&self) -> Vec<Pin> {
        vec![Pin::exec("Ticked")]
    }
}

impl AddOn for Ticker {}

fn names(pins: &[Pin]) -> Vec<&str> {
    pins.iter().map(|p| &p.name[..]).collect()
}

#[test]
fn test_default_declared_pins() {
    struct Plain;
    impl DataPinValueSupplier for Plain {}
    impl Node for Plain {}

    let mut g = GraphInstance::default();
    let n = g.add_node(Plain);
    assert_eq!(names(g.input_pins(n).unwrap()), ["In"]);
    assert_eq!(names(g.output_pins(n).unwrap()), ["Out"]);
    assert!(g.context_inputs(n).unwrap().is_empty());
}

#[test]
fn test_empty_node_gets_default_context_pins() {
    let mut g = GraphInstance::default();
    let n = g.add_node(Empty);
    let pins = g.pins(n).unwrap();
    assert_eq!(names(&pins.inputs.effective), ["In"]);
    assert_eq!(names(&pins.outputs.effective), ["Out"]);
    assert!(pins.inputs.effective[0].context);
    assert!(pins.inputs.is_own("In"));
    assert_eq!(pins.inputs.effective[0].pin_type, PinType::Exec);
}

#[test]
fn test_no_default_when_add_ons_contribute() {
    let mut g = GraphInstance::default();
    let n = g.add_node(Empty);
    g.attach_add_on(n, AddOnTemplate::new(Ticker)).unwrap();
    assert_eq!(names(g.input_pins(n).unwrap()), ["Tick"]);
    assert_eq!(names(g.output_pins(n).unwrap()), ["Ticked"]);
    assert!(g.supported_input_pins(n).unwrap().is_empty());
}

#[test]
fn test_context_pins_are_not_duplicated() {
    let mut g = GraphInstance::default();
    let n = g.add_node(Overlapping);
    assert_eq!(names(g.input_pins(n).unwrap()), ["In", "Extra"]);
    assert_eq!(names(g.supported_input_pins(n).unwrap()), ["In", "Extra"]);
    assert_eq!(names(g.context_inputs(n).unwrap()), ["In", "Extra"]);
}

#[test]
fn test_add_on_pins_are_not_own() {
    let mut g = GraphInstance::default();
    let n = g.add_node(Overlapping);
    g.attach_add_on(n, AddOnTemplate::new(Ticker)).unwrap();
    let pins = g.pins(n).unwrap();
    assert_eq!(names(&pins.inputs.effective), ["In", "Extra", "Tick"]);
    assert!(!pins.inputs.is_own("Tick"));
    assert!(pins.inputs.contains("Tick"));
    assert_eq!(names(&pins.outputs.effective), ["Out", "Ticked"]);
}

#[test]
fn test_pins_freeze_on_initialize() {
    let enabled = Rc::new(Cell::new(false));
    let mut g = GraphInstance::default();
    let n = g.add_node(Switchable {
        enabled: enabled.clone(),
    });
    assert_eq!(names(g.input_pins(n).unwrap()), ["In"]);

    enabled.set(true);
    g.refresh_pins(n);
    assert_eq!(names(g.input_pins(n).unwrap()), ["Go"]);
    assert_eq!(names(g.output_pins(n).unwrap()), ["Done"]);

    g.initialize().unwrap();
    assert!(g.pins(n).unwrap().frozen);
    enabled.set(false);
    g.refresh_pins(n);
    assert_eq!(names(g.input_pins(n).unwrap()), ["Go"]);
}

#[test]
fn test_validate_connections() {
    let enabled = Rc::new(Cell::new(true));
    let mut g = GraphInstance::default();
    let s = g.add_node(Switchable {
        enabled: enabled.clone(),
    });
    let e = g.add_node(Empty);
    let o = g.add_node(Overlapping);
    g.connect(s, "Done", e, "In").unwrap();
    g.connect(e, "Out", o, "Extra").unwrap();
    g.connect(e, "Out", o, "In").unwrap();

    let log = g.validate();
    assert!(log.for_node(s).next().is_none());
    let errors: Vec<_> = log.for_node(o).map(|i| &i.message[..]).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("input `Extra` of type"));

    // The output disappears once the node stops contributing it.
    enabled.set(false);
    g.refresh_pins(s);
    let log = g.validate();
    let errors: Vec<_> = log.for_node(s).map(|i| &i.message[..]).collect();
    assert_eq!(errors, ["connected output `Done` does not exist"]);
    assert!(log.has_errors());
}

#[test]
fn test_data_pins() {
    assert!(PinType::DATA.iter().all(|t| t.is_data()));
    assert!(!PinType::Exec.is_data());
    let pin = Pin::new("Speed", PinType::Float).with_default();
    assert!(pin.has_default);
    assert!(!pin.context);
}
