// Tests for the `FormatText` node.

use flow_core::value::{InstancedStruct, Name, Text};
use flow_core::{
    DataPinResolveResult, DataPinValueSupplier, GraphInstance, Node, NodeId, Pin, PinType,
};
use flow_std::{Constant, FormatText};

// A node with one input per text-like type.
struct Sink;

impl DataPinValueSupplier for Sink {}
impl Node for Sink {
    fn input_pins(&self) -> Vec<Pin> {
        vec![
            Pin::new("Text", PinType::Text),
            Pin::new("String", PinType::String),
            Pin::new("Name", PinType::Name),
            Pin::new("Int", PinType::Int),
        ]
    }
}

fn score() -> FormatText {
    FormatText::new("{Name} scored {Score}")
        .with_param("Name", String::from("Ada"))
        .with_param("Score", 3i64)
}

// Connect the formatted text to every input of a sink.
fn with_sink(g: &mut GraphInstance, format: NodeId) -> NodeId {
    let sink = g.add_node(Sink);
    for input in ["Text", "String", "Name", "Int"] {
        g.connect(format, "Formatted Text", sink, input).unwrap();
    }
    sink
}

#[test]
fn test_formatted_as_each_text_type() {
    let mut g = GraphInstance::default();
    let f = g.add_node(score());
    let sink = with_sink(&mut g, f);

    let expected = "Ada scored 3";
    assert_eq!(g.resolve::<Text>(sink, "Text").into_value(), Some(Text(expected.into())));
    assert_eq!(g.resolve::<String>(sink, "String").into_value().as_deref(), Some(expected));
    assert_eq!(g.resolve::<Name>(sink, "Name").into_value(), Some(Name(expected.into())));
    assert_eq!(
        g.resolve::<i64>(sink, "Int").result(),
        DataPinResolveResult::FailedMismatchedType
    );
}

#[test]
fn test_connected_parameter() {
    let mut g = GraphInstance::default();
    let f = g.add_node(score());
    let c = g.add_node(Constant::new(7i64));
    g.connect(c, "Value", f, "Score").unwrap();
    let sink = with_sink(&mut g, f);

    assert_eq!(
        g.resolve::<String>(sink, "String").into_value().as_deref(),
        Some("Ada scored 7")
    );
}

#[test]
fn test_connected_format() {
    let mut g = GraphInstance::default();
    let f = g.add_node(score());
    let c = g.add_node(Constant::new(Text("Well done {Name}!".into())));
    g.connect(c, "Value", f, "Format").unwrap();
    let sink = with_sink(&mut g, f);

    assert_eq!(
        g.resolve::<String>(sink, "String").into_value().as_deref(),
        Some("Well done Ada!")
    );
}

#[test]
fn test_struct_parameter_fails() {
    let _ = env_logger::try_init();
    let mut g = GraphInstance::default();
    let data = InstancedStruct {
        type_name: "Stats".into(),
        data: serde_json::json!({ "hp": 10 }),
    };
    let f = g.add_node(score().with_param("Stats", data));
    let sink = with_sink(&mut g, f);

    assert_eq!(
        g.resolve::<String>(sink, "String").result(),
        DataPinResolveResult::FailedWithError
    );
}

#[test]
fn test_pins() {
    let f = score();
    let inputs: Vec<_> = f.input_pins().into_iter().map(|p| (p.name, p.pin_type)).collect();
    assert_eq!(
        inputs,
        [
            ("Format".to_string(), PinType::Text),
            ("Name".to_string(), PinType::String),
            ("Score".to_string(), PinType::Int),
        ]
    );
    assert!(f.input_pins().iter().all(|p| p.has_default));
    assert_eq!(f.output_pins(), [Pin::new("Formatted Text", PinType::Text)]);
}

#[test]
fn test_unknown_placeholder_is_kept() {
    let mut g = GraphInstance::default();
    let f = g.add_node(FormatText::new("{Greeting}, {Name}").with_param("Name", String::from("Ada")));
    let sink = with_sink(&mut g, f);
    assert_eq!(
        g.resolve::<String>(sink, "String").into_value().as_deref(),
        Some("{Greeting}, Ada")
    );
}
