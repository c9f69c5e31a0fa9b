use flow_core::pin::PinType;
use flow_core::{DataPinResolveResult, DataPinResult, DataPinValueSupplier, ExecCtx, Node, Pin};
use flow_core::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, SupplyCtx, Value};
use serde::{Deserialize, Serialize};

/// A node that logs a message at a given level whenever it is executed, then
/// passes execution through.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Log {
    pub level: log::Level,
    /// Logged when nothing is connected to the `Message` pin.
    pub message: String,
}

impl Log {
    /// The data pin carrying the message.
    pub const MESSAGE: &'static str = "Message";

    pub fn new(level: log::Level, message: impl Into<String>) -> Self {
        Log {
            level,
            message: message.into(),
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: log::Level::Info,
            message: String::new(),
        }
    }
}

impl DataPinValueSupplier for Log {
    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        match (pin, pin_type) {
            (Self::MESSAGE, PinType::String) => DataPinResult::success(Value::String(self.message.clone())),
            (Self::MESSAGE, _) => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
            _ => DataPinResult::invalid(),
        }
    }
}

impl Node for Log {
    fn input_pins(&self) -> Vec<Pin> {
        vec![
            Pin::exec(DEFAULT_INPUT_PIN),
            Pin::new(Self::MESSAGE, PinType::String).with_default(),
        ]
    }

    fn execute_input(&mut self, ctx: &mut ExecCtx, pin: &str) {
        if pin != DEFAULT_INPUT_PIN {
            return;
        }
        let result = ctx.resolve::<String>(&*self, Self::MESSAGE);
        match result.into_value() {
            Some(message) => log::log!(self.level, "{message}"),
            None => ctx.log_warning("could not resolve the message to log"),
        }
        ctx.trigger_output(DEFAULT_OUTPUT_PIN, false);
    }
}
