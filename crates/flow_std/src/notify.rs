use flow_core::pin::PinType;
use flow_core::value::{GameplayTag, GameplayTagContainer};
use flow_core::{DataPinResolveResult, DataPinResult, DataPinValueSupplier, ExecCtx, Node, Pin};
use flow_core::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, SupplyCtx, Value};
use serde::{Deserialize, Serialize};

/// Sends a notification tag to every actor carrying one of the identity tags,
/// then finishes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct NotifyActor {
    /// Actors matching any of these tags are notified.
    pub identity_tags: GameplayTagContainer,
    /// Sent when nothing is connected to the `Notify Tag` pin.
    pub notify_tag: GameplayTag,
}

impl NotifyActor {
    /// The data pin carrying the tag to send.
    pub const NOTIFY_TAG: &'static str = "Notify Tag";

    pub fn new(identity_tags: GameplayTagContainer, notify_tag: GameplayTag) -> Self {
        NotifyActor {
            identity_tags,
            notify_tag,
        }
    }
}

impl DataPinValueSupplier for NotifyActor {
    fn try_supply_data_pin(&self, _ctx: &SupplyCtx, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        match (pin, pin_type) {
            (Self::NOTIFY_TAG, PinType::GameplayTag) => {
                DataPinResult::success(Value::GameplayTag(self.notify_tag.clone()))
            }
            (Self::NOTIFY_TAG, _) => DataPinResult::failed(DataPinResolveResult::FailedMismatchedType),
            _ => DataPinResult::invalid(),
        }
    }
}

impl Node for NotifyActor {
    fn input_pins(&self) -> Vec<Pin> {
        vec![
            Pin::exec(DEFAULT_INPUT_PIN),
            Pin::new(Self::NOTIFY_TAG, PinType::GameplayTag).with_default(),
        ]
    }

    fn execute_input(&mut self, ctx: &mut ExecCtx, pin: &str) {
        if pin != DEFAULT_INPUT_PIN {
            return;
        }
        match ctx.resolve::<GameplayTag>(&*self, Self::NOTIFY_TAG).into_value() {
            Some(tag) if tag.is_valid() => {
                let actors = ctx.world().actors_with_tags(&self.identity_tags);
                log::debug!("notifying {} actor(s) with `{tag}`", actors.len());
                for actor in actors {
                    ctx.world_mut().notify_actor(actor, &tag);
                }
            }
            _ => ctx.log_error("no valid notify tag to send"),
        }
        ctx.trigger_output(DEFAULT_OUTPUT_PIN, true);
    }
}
