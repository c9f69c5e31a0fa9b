use flow_core::pin::PinType;
use flow_core::value::Text;
use flow_core::{DataPinResolveResult, DataPinResult, DataPinValueSupplier, Node, Pin};
use flow_core::{SupplyCtx, Value};
use serde::{Deserialize, Serialize};

/// Supplies text built from a format string and a set of named parameters.
///
/// Every `{Name}` placeholder in the `Format` pin's text is replaced with the
/// resolved value of the parameter pin called `Name`. Placeholders naming no
/// parameter are left as they are.
///
/// The result may be requested as `Text`, `String` or `Name`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FormatText {
    /// Used when nothing is connected to the `Format` pin.
    pub format: Text,
    /// The parameter pins along with their default values.
    pub params: Vec<(String, Value)>,
}

impl FormatText {
    /// The data pin carrying the format string.
    pub const FORMAT: &'static str = "Format";
    /// The data pin supplying the formatted text.
    pub const FORMATTED_TEXT: &'static str = "Formatted Text";

    pub fn new(format: impl Into<String>) -> Self {
        FormatText {
            format: Text(format.into()),
            params: vec![],
        }
    }

    /// Builder for a named parameter with a default value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Resolve the format and every parameter, then substitute.
    fn try_format(&self, ctx: &SupplyCtx) -> Result<String, DataPinResolveResult> {
        let format = ctx.resolve::<Text>(Self::FORMAT);
        let Some(Text(format)) = format.into_value() else {
            return Err(DataPinResolveResult::FailedWithError);
        };
        let mut args = Vec::with_capacity(self.params.len());
        for (name, default) in &self.params {
            let pin_type = default.pin_type();
            if matches!(pin_type, PinType::Exec | PinType::InstancedStruct) {
                log::warn!("`{name}` cannot be used as a text format parameter");
                return Err(DataPinResolveResult::FailedWithError);
            }
            match ctx.resolve_value(name, pin_type).into_value() {
                Some(value) => args.push((&name[..], value)),
                None => return Err(DataPinResolveResult::FailedWithError),
            }
        }
        Ok(format_named(&format, &args))
    }
}

impl DataPinValueSupplier for FormatText {
    fn try_supply_data_pin(&self, ctx: &SupplyCtx, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        if pin == Self::FORMAT {
            return match pin_type {
                PinType::Text => DataPinResult::success(Value::Text(self.format.clone())),
                _ => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
            };
        }
        if let Some(value) = self.param(pin) {
            return match pin_type == value.pin_type() {
                true => DataPinResult::success(value.clone()),
                false => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
            };
        }
        if pin != Self::FORMATTED_TEXT {
            return DataPinResult::invalid();
        }

        let text = match self.try_format(ctx) {
            Ok(text) => text,
            Err(result) => return DataPinResult::failed(result),
        };
        match pin_type {
            PinType::Text => DataPinResult::success(Value::Text(Text(text))),
            PinType::String => DataPinResult::success(Value::String(text)),
            PinType::Name => DataPinResult::success(Value::Name(flow_core::value::Name(text))),
            _ => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
        }
    }
}

impl Node for FormatText {
    fn input_pins(&self) -> Vec<Pin> {
        let mut pins = vec![Pin::new(Self::FORMAT, PinType::Text).with_default()];
        for (name, value) in &self.params {
            pins.push(Pin::new(name.clone(), value.pin_type()).with_default());
        }
        pins
    }

    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::new(Self::FORMATTED_TEXT, PinType::Text)]
    }
}

/// Replace `{name}` placeholders with the matching argument.
pub fn format_named(format: &str, args: &[(&str, Value)]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match args.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(&value.to_string()),
            None => out.push_str(&rest[start..start + end + 2]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_placeholders_are_kept() {
        let args = [("Name", Value::String("Ada".into())), ("Count", Value::Int(3))];
        let s = format_named("{Name} has {Count} {Things}", &args);
        assert_eq!(s, "Ada has 3 {Things}");
    }

    #[test]
    fn unclosed_brace_is_kept() {
        assert_eq!(format_named("a {b", &[]), "a {b");
    }
}
