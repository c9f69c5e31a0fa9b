use flow_core::pin::PinType;
use flow_core::{DataPinResolveResult, DataPinResult, DataPinValueSupplier, Node, Pin};
use flow_core::{SupplyCtx, Value};
use serde::{Deserialize, Serialize};

/// Supplies a fixed value on its `Value` output.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Constant {
    pub value: Value,
}

impl Constant {
    /// The data pin carrying the value.
    pub const VALUE: &'static str = "Value";

    pub fn new(value: impl Into<Value>) -> Self {
        Constant {
            value: value.into(),
        }
    }
}

impl DataPinValueSupplier for Constant {
    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        if pin != Self::VALUE {
            return DataPinResult::invalid();
        }
        if pin_type != self.value.pin_type() {
            return DataPinResult::failed(DataPinResolveResult::FailedMismatchedType);
        }
        DataPinResult::success(self.value.clone())
    }
}

impl Node for Constant {
    fn input_pins(&self) -> Vec<Pin> {
        vec![]
    }

    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::new(Self::VALUE, self.value.pin_type())]
    }
}
