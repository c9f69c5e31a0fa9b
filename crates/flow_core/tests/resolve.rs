// Tests for data pin resolution.

use flow_core::{
    AddOn, AddOnTemplate, ContextPinSupplier, DataPinResolveResult, DataPinResult,
    DataPinValueSupplier, GraphInstance, HostServices, Node, NodeId, Pin, PinType, Settings,
    SupplyCtx, Value,
};
use std::cell::Cell;
use std::rc::Rc;

// Supplies a fixed answer on its `Value` output and counts queries.
struct Source {
    pin_type: PinType,
    answer: DataPinResult<Value>,
    calls: Rc<Cell<usize>>,
    enabled: bool,
}

// A node with the given input pins, supplying `default` for pins with a default.
struct Sink {
    inputs: Vec<Pin>,
    default: Option<Value>,
}

// Supplies `Y` by resolving its own `X`.
struct Echo;

// An add-on supplying `Value` on behalf of its node.
#[derive(Clone)]
struct Fallback(f64);

impl Source {
    fn new(pin_type: PinType, answer: DataPinResult<Value>) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let source = Source {
            pin_type,
            answer,
            calls: calls.clone(),
            enabled: true,
        };
        (source, calls)
    }
}

impl Sink {
    fn float() -> Self {
        Sink {
            inputs: vec![Pin::new("Value", PinType::Float)],
            default: None,
        }
    }

    fn float_with_default(value: f64) -> Self {
        Sink {
            inputs: vec![Pin::new("Value", PinType::Float).with_default()],
            default: Some(Value::Float(value)),
        }
    }
}

impl DataPinValueSupplier for Source {
    fn can_supply_data_pin_values(&self) -> bool {
        self.enabled
    }

    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, _: PinType) -> DataPinResult<Value> {
        self.calls.set(self.calls.get() + 1);
        match pin {
            "Value" => self.answer.clone(),
            _ => DataPinResult::invalid(),
        }
    }
}

impl Node for Source {
    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::new("Value", self.pin_type)]
    }
}

impl DataPinValueSupplier for Sink {
    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, _: PinType) -> DataPinResult<Value> {
        let has_default = self.inputs.iter().any(|p| p.name == pin && p.has_default);
        match (&self.default, has_default) {
            (Some(value), true) => DataPinResult::success(value.clone()),
            _ => DataPinResult::invalid(),
        }
    }
}

impl Node for Sink {
    fn input_pins(&self) -> Vec<Pin> {
        self.inputs.clone()
    }
}

impl DataPinValueSupplier for Echo {
    fn try_supply_data_pin(&self, ctx: &SupplyCtx, pin: &str, _: PinType) -> DataPinResult<Value> {
        match pin {
            "Y" => ctx.resolve::<i64>("X").map(Value::Int),
            _ => DataPinResult::invalid(),
        }
    }
}

impl Node for Echo {
    fn input_pins(&self) -> Vec<Pin> {
        vec![Pin::new("X", PinType::Int)]
    }

    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::new("Y", PinType::Int)]
    }
}

impl DataPinValueSupplier for Fallback {
    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, _: PinType) -> DataPinResult<Value> {
        match pin {
            "Value" => DataPinResult::success(Value::Float(self.0)),
            _ => DataPinResult::invalid(),
        }
    }
}

impl ContextPinSupplier for Fallback {}
impl AddOn for Fallback {}

fn failed(result: DataPinResolveResult) -> DataPinResult<Value> {
    DataPinResult::failed(result)
}

#[test]
fn test_unconnected_without_default() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let result = g.resolve::<f64>(sink, "Value");
    assert_eq!(result.result(), DataPinResolveResult::FailedUnconnected);
    assert!(result.value().is_none());
}

#[test]
fn test_missing_pin_and_node() {
    let _ = env_logger::try_init();
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    assert_eq!(
        g.resolve::<f64>(sink, "Nope").result(),
        DataPinResolveResult::FailedMissingPin
    );
    assert_eq!(
        g.resolve::<f64>(NodeId::new(7), "Value").result(),
        DataPinResolveResult::FailedWithError
    );
}

#[test]
fn test_mismatched_type_connected_or_not() {
    let mut g = GraphInstance::default();
    let lonely = g.add_node(Sink::float());
    let sink = g.add_node(Sink::float());
    let (source, calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(1.0)));
    let source = g.add_node(source);
    g.connect(source, "Value", sink, "Value").unwrap();

    for node in [lonely, sink] {
        assert_eq!(
            g.resolve::<i64>(node, "Value").result(),
            DataPinResolveResult::FailedMismatchedType
        );
    }
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_first_success_short_circuits() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, a_calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(1.0)));
    let (b, b_calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(2.0)));
    let a = g.add_node(a);
    let b = g.add_node(b);
    g.connect(a, "Value", sink, "Value").unwrap();
    g.connect(b, "Value", sink, "Value").unwrap();

    let result = g.resolve_data_pin_as_float(sink, "Value");
    assert!(result.is_success());
    assert_eq!(result.value(), Some(&1.0));
    assert_eq!(a_calls.get(), 1);
    assert_eq!(b_calls.get(), 0);
}

#[test]
fn test_invalid_falls_through() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, a_calls) = Source::new(PinType::Float, DataPinResult::invalid());
    let (b, b_calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(2.0)));
    let a = g.add_node(a);
    let b = g.add_node(b);
    g.connect(a, "Value", sink, "Value").unwrap();
    g.connect(b, "Value", sink, "Value").unwrap();

    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(2.0));
    assert_eq!((a_calls.get(), b_calls.get()), (1, 1));
}

#[test]
fn test_hard_failure_is_not_overwritten_by_invalid() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, _) = Source::new(PinType::Float, failed(DataPinResolveResult::FailedWithError));
    let (b, b_calls) = Source::new(PinType::Float, DataPinResult::invalid());
    let a = g.add_node(a);
    let b = g.add_node(b);
    g.connect(a, "Value", sink, "Value").unwrap();
    g.connect(b, "Value", sink, "Value").unwrap();

    let result = g.resolve::<f64>(sink, "Value");
    assert_eq!(result.result(), DataPinResolveResult::FailedWithError);
    assert_eq!(b_calls.get(), 1);
}

#[test]
fn test_default_follows_connections() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float_with_default(3.0));
    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(3.0));

    let (a, a_calls) = Source::new(PinType::Float, DataPinResult::invalid());
    let a = g.add_node(a);
    g.connect(a, "Value", sink, "Value").unwrap();
    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(3.0));
    assert_eq!(a_calls.get(), 1);

    let (b, _) = Source::new(PinType::Float, DataPinResult::success(Value::Float(4.0)));
    let b = g.add_node(b);
    g.connect(b, "Value", sink, "Value").unwrap();
    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(4.0));
}

#[test]
fn test_disabled_suppliers_are_skipped() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (mut a, a_calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(1.0)));
    a.enabled = false;
    let (b, _) = Source::new(PinType::Float, DataPinResult::success(Value::Float(2.0)));
    let a = g.add_node(a);
    let b = g.add_node(b);
    g.connect(a, "Value", sink, "Value").unwrap();
    g.connect(b, "Value", sink, "Value").unwrap();

    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(2.0));
    assert_eq!(a_calls.get(), 0);
}

#[test]
fn test_supplied_value_of_wrong_type() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, _) = Source::new(PinType::Float, DataPinResult::success(Value::Int(1)));
    let a = g.add_node(a);
    g.connect(a, "Value", sink, "Value").unwrap();
    assert_eq!(
        g.resolve::<f64>(sink, "Value").result(),
        DataPinResolveResult::FailedMismatchedType
    );
}

#[test]
fn test_add_on_supplies_for_its_node() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, a_calls) = Source::new(PinType::Float, DataPinResult::invalid());
    let a = g.add_node(a);
    g.attach_add_on(a, AddOnTemplate::new(Fallback(7.0))).unwrap();
    g.connect(a, "Value", sink, "Value").unwrap();
    g.initialize().unwrap();

    assert_eq!(g.resolve::<f64>(sink, "Value").into_value(), Some(7.0));
    assert_eq!(a_calls.get(), 1);
}

#[test]
fn test_resolution_is_repeatable() {
    let mut g = GraphInstance::default();
    let sink = g.add_node(Sink::float());
    let (a, calls) = Source::new(PinType::Float, DataPinResult::success(Value::Float(1.5)));
    let a = g.add_node(a);
    g.connect(a, "Value", sink, "Value").unwrap();

    let first = g.resolve::<f64>(sink, "Value");
    let second = g.resolve::<f64>(sink, "Value");
    assert_eq!(first, second);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_nested_resolution_depth_is_bounded() {
    let _ = env_logger::try_init();
    let settings = Settings {
        max_resolve_depth: 8,
        ..Default::default()
    };
    let mut g = GraphInstance::with_settings(HostServices::default(), settings);
    let a = g.add_node(Echo);
    let b = g.add_node(Echo);
    g.connect(a, "Y", b, "X").unwrap();
    g.connect(b, "Y", a, "X").unwrap();

    assert_eq!(
        g.resolve_data_pin_as_int(a, "X").result(),
        DataPinResolveResult::FailedWithError
    );
}

#[test]
fn test_nested_resolution() {
    let mut g = GraphInstance::default();
    let (source, _) = Source::new(PinType::Int, DataPinResult::success(Value::Int(5)));
    let source = g.add_node(source);
    let echo = g.add_node(Echo);
    let sink = g.add_node(Sink {
        inputs: vec![Pin::new("Value", PinType::Int)],
        default: None,
    });
    g.connect(source, "Value", echo, "X").unwrap();
    g.connect(echo, "Y", sink, "Value").unwrap();

    assert_eq!(g.resolve::<i64>(sink, "Value").into_value(), Some(5));
}
