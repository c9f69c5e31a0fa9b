//! Capability traits shared by nodes, add-ons and components.
//!
//! An entity opts into a capability by implementing the trait. Components
//! expose the traits they implement through the accessors on
//! [`Component`][crate::world::Component], which the proxy node queries once
//! and caches as [`Capabilities`].

use crate::exec::ComponentCtx;
use crate::pin::{Pin, PinType};
use crate::resolve::{DataPinResult, SupplyCtx};
use crate::value::Value;
use crate::world::Component;

/// The lifecycle surface of an externally driven executable.
///
/// All methods default to doing nothing.
pub trait CoreExecutable {
    fn initialize_instance(&mut self, _ctx: &mut ComponentCtx) {}
    fn deinitialize_instance(&mut self, _ctx: &mut ComponentCtx) {}
    fn preload_content(&mut self, _ctx: &mut ComponentCtx) {}
    fn flush_content(&mut self, _ctx: &mut ComponentCtx) {}
    fn on_activate(&mut self, _ctx: &mut ComponentCtx) {}
    fn cleanup(&mut self, _ctx: &mut ComponentCtx) {}
    fn force_finish_node(&mut self, _ctx: &mut ComponentCtx) {}
    fn execute_input(&mut self, _ctx: &mut ComponentCtx, _pin: &str) {}
}

/// Implemented by executables that may be driven through a proxy node.
pub trait ExternalExecutable {
    /// Called immediately before `on_activate` whenever the executable is
    /// driven by the proxy node `ctx.node()`.
    fn pre_activate_external_flow_executable(&mut self, ctx: &mut ComponentCtx);
}

/// Supplies values for data pins on request.
pub trait DataPinValueSupplier {
    /// Whether this supplier takes part in resolution at all.
    fn can_supply_data_pin_values(&self) -> bool {
        true
    }

    /// Supply a value of type `pin_type` for the pin named `pin`.
    ///
    /// Return [`DataPinResult::invalid`] for pins the supplier does not claim
    /// so that resolution moves on to the next candidate.
    fn try_supply_data_pin(
        &self,
        _ctx: &SupplyCtx,
        _pin: &str,
        _pin_type: PinType,
    ) -> DataPinResult<Value> {
        DataPinResult::invalid()
    }
}

/// Contributes pins depending on the current configuration.
pub trait ContextPinSupplier {
    fn context_inputs(&self) -> Vec<Pin> {
        vec![]
    }

    fn context_outputs(&self) -> Vec<Pin> {
        vec![]
    }
}

/// The capabilities a component was found to implement.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Capabilities {
    pub core_executable: bool,
    pub external_executable: bool,
    pub data_pin_supplier: bool,
    pub context_pin_supplier: bool,
}

impl Capabilities {
    /// Query every capability accessor of the component.
    pub fn of(component: &mut dyn Component) -> Self {
        Capabilities {
            core_executable: component.as_core_executable().is_some(),
            external_executable: component.as_external_executable().is_some(),
            data_pin_supplier: component.as_data_pin_supplier().is_some(),
            context_pin_supplier: component.as_context_pin_supplier().is_some(),
        }
    }

    /// Whether the component may be driven by a proxy node.
    pub fn is_executable(&self) -> bool {
        self.core_executable && self.external_executable
    }
}
