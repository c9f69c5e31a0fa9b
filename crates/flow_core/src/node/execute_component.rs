//! A node driving an executable component living on the graph's owner actor.

use crate::capability::{Capabilities, CoreExecutable, DataPinValueSupplier};
use crate::exec::{ComponentCtx, ExecCtx};
use crate::graph::NodeId;
use crate::host::HostServices;
use crate::inject::InjectComponentsManager;
use crate::node::Node;
use crate::pin::{DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, Pin, PinType};
use crate::resolve::{DataPinResult, SupplyCtx};
use crate::validate::ValidationLog;
use crate::value::Value;
use crate::world::{Component, ComponentClass, ComponentId};
use std::fmt;

/// Where the driven component comes from.
#[derive(Clone, Default)]
pub enum ComponentSource {
    #[default]
    Undetermined,
    /// A component already attached to the owner under the given name.
    BindToExisting(String),
    /// A copy of the template, attached to the owner on initialization.
    InjectFromTemplate(Box<dyn Component>),
    /// An instance of the class attached to the owner on initialization.
    InjectFromClass {
        class: ComponentClass,
        /// Use a component of the class already on the owner if there is one.
        reuse_existing: bool,
        /// Whether a new instance may be created when none is reused.
        allow_inject: bool,
    },
}

/// Forwards its lifecycle to a component implementing [`CoreExecutable`].
///
/// The component is injected when the node is initialized if the source asks
/// for it. Until a component is resolved, every lifecycle call looks it up
/// again, so a component attached to the owner later is still picked up. It
/// is released before the node's add-ons are deinitialized. Calls made while
/// no component is resolved are logged and otherwise skipped, and execution
/// still passes through the default output.
#[derive(Default)]
pub struct ExecuteComponent {
    source: ComponentSource,
    component: Option<ComponentId>,
    capabilities: Capabilities,
    inject_manager: Option<InjectComponentsManager>,
}

impl ComponentSource {
    /// Whether the component is created by the node rather than found.
    pub fn uses_inject_manager(&self) -> bool {
        matches!(
            self,
            ComponentSource::InjectFromTemplate(_) | ComponentSource::InjectFromClass { .. }
        )
    }
}

impl ExecuteComponent {
    pub fn new(source: ComponentSource) -> Self {
        ExecuteComponent {
            source,
            ..Default::default()
        }
    }

    /// Drive the component attached to the owner under `name`.
    pub fn bind_to_existing(name: impl Into<String>) -> Self {
        Self::new(ComponentSource::BindToExisting(name.into()))
    }

    /// Drive a copy of `template` injected into the owner.
    pub fn inject_from_template(template: impl Component) -> Self {
        Self::new(ComponentSource::InjectFromTemplate(Box::new(template)))
    }

    /// Drive an instance of `class` on the owner.
    pub fn inject_from_class(class: ComponentClass, reuse_existing: bool, allow_inject: bool) -> Self {
        Self::new(ComponentSource::InjectFromClass {
            class,
            reuse_existing,
            allow_inject,
        })
    }

    pub fn source(&self) -> &ComponentSource {
        &self.source
    }

    /// The resolved component, if any.
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    /// The capabilities found on the resolved component.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn inject_manager(&self) -> Option<&InjectComponentsManager> {
        self.inject_manager.as_ref()
    }

    /// Create the component when the source asks for injection.
    ///
    /// Returns whether a component was injected or reused.
    fn try_inject_component(&mut self, ctx: &mut ExecCtx) -> bool {
        if !self.source.uses_inject_manager() || self.component.is_some() {
            return false;
        }
        let Some(owner) = ctx.owner() else {
            return false;
        };

        let world = ctx.world_mut();
        let mut manager = InjectComponentsManager::new();
        let component = match &self.source {
            ComponentSource::InjectFromTemplate(template) => {
                manager.inject_from_template(world, owner, &**template)
            }
            ComponentSource::InjectFromClass {
                class,
                reuse_existing,
                allow_inject,
            } => {
                let existing = match reuse_existing {
                    true => world.find_component_by_class(owner, class),
                    false => None,
                };
                match existing {
                    Some(id) => Some(id),
                    None if !allow_inject => None,
                    None => manager.inject_from_class(world, owner, class),
                }
            }
            _ => None,
        };
        self.inject_manager = Some(manager);
        self.component = component;
        component.is_some()
    }

    /// The resolved component, resolving a bound component by name if
    /// necessary.
    fn try_resolve_component(&mut self, ctx: &mut ExecCtx) -> Option<ComponentId> {
        if self.component.is_some() {
            return self.component;
        }
        let Some(owner) = ctx.owner() else {
            let name = match &self.source {
                ComponentSource::BindToExisting(name) => &name[..],
                _ => "",
            };
            ctx.log_error(format!(
                "expected an owner actor to resolve component `{name}`"
            ));
            return None;
        };
        // Injected components are optional, so only named components are looked up.
        if let ComponentSource::BindToExisting(name) = &self.source {
            let found = ctx.world().find_component_by_name(owner, name);
            if found.is_none() {
                ctx.log_warning(format!("no component named `{name}` on the owner actor"));
            }
            self.component = found;
        }
        self.component
    }

    /// Cache the capabilities of the resolved component.
    fn bind(&mut self, ctx: &mut ExecCtx) {
        let Some(id) = self.component else {
            return;
        };
        match ctx.world_mut().component_mut(id) {
            Some(component) => self.capabilities = Capabilities::of(component),
            None => {
                self.component = None;
                self.capabilities = Capabilities::default();
            }
        }
    }

    /// The cached component, or the result of resolving and binding it anew.
    fn ensure_component(&mut self, ctx: &mut ExecCtx) -> Option<ComponentId> {
        if self.component.is_none() && self.try_resolve_component(ctx).is_some() {
            self.bind(ctx);
        }
        self.component
    }

    /// Call `f` with the component's core executable surface.
    ///
    /// Returns `false` if there is no component or it lacks the capability.
    fn with_core<F>(&mut self, ctx: &mut ExecCtx, f: F) -> bool
    where
        F: FnOnce(&mut dyn CoreExecutable, &mut ComponentCtx),
    {
        let Some(id) = self.ensure_component(ctx) else {
            return false;
        };
        if !self.capabilities.core_executable {
            return false;
        }
        let (world, mut cctx) = ctx.component_scope();
        let Some(core) = world
            .component_mut(id)
            .and_then(|component| component.as_core_executable())
        else {
            return false;
        };
        f(core, &mut cctx);
        true
    }

    /// The component the node is expected to drive, if it can be determined
    /// before the node is initialized.
    fn expected_component<'a>(&'a self, host: &'a HostServices) -> Option<&'a dyn Component> {
        let world = host.world();
        if let Some(id) = self.component {
            return world.component(id);
        }
        match &self.source {
            ComponentSource::Undetermined => None,
            ComponentSource::BindToExisting(name) => {
                let id = world.find_component_by_name(host.owner()?, name)?;
                world.component(id)
            }
            ComponentSource::InjectFromTemplate(template) => Some(&**template),
            ComponentSource::InjectFromClass {
                class,
                reuse_existing,
                ..
            } => {
                let existing = match (reuse_existing, host.owner()) {
                    (true, Some(owner)) => world.find_component_by_class(owner, class),
                    _ => None,
                };
                match existing {
                    Some(id) => world.component(id),
                    None => world.class_default(class),
                }
            }
        }
    }

    fn component_name(&self, host: &HostServices) -> Option<String> {
        if let Some(name) = self.component.and_then(|id| host.world().component_name(id)) {
            return Some(name.to_string());
        }
        match &self.source {
            ComponentSource::Undetermined => None,
            ComponentSource::BindToExisting(name) => Some(name.clone()),
            ComponentSource::InjectFromTemplate(template) => {
                Some(template.class().display_name().to_string())
            }
            ComponentSource::InjectFromClass { class, .. } => {
                Some(class.display_name().to_string())
            }
        }
    }

    /// A title naming the driven component, e.g. `Execute Door`.
    pub fn title_with(&self, host: &HostServices) -> String {
        match self.component_name(host) {
            Some(name) => format!("Execute {name}"),
            None => self.title(),
        }
    }
}

impl DataPinValueSupplier for ExecuteComponent {
    fn try_supply_data_pin(&self, ctx: &SupplyCtx, pin: &str, pin_type: PinType) -> DataPinResult<Value> {
        let supplier = self
            .component
            .and_then(|id| ctx.world().component(id))
            .and_then(|component| component.as_data_pin_supplier())
            .filter(|supplier| supplier.can_supply_data_pin_values());
        match supplier {
            Some(supplier) => {
                let result = supplier.try_supply_data_pin(ctx, pin, pin_type);
                match result.is_success() {
                    true => result,
                    false => DataPinResult::invalid(),
                }
            }
            None => DataPinResult::invalid(),
        }
    }
}

impl Node for ExecuteComponent {
    fn title(&self) -> String {
        match &self.source {
            ComponentSource::BindToExisting(name) => format!("Execute {name}"),
            ComponentSource::InjectFromTemplate(template) => {
                format!("Execute {}", template.class().display_name())
            }
            ComponentSource::InjectFromClass { class, .. } => {
                format!("Execute {}", class.display_name())
            }
            ComponentSource::Undetermined => "Execute Component".to_string(),
        }
    }

    fn input_pins(&self) -> Vec<Pin> {
        vec![]
    }

    fn output_pins(&self) -> Vec<Pin> {
        vec![]
    }

    fn context_inputs(&self, host: &HostServices) -> Vec<Pin> {
        let pins = self
            .expected_component(host)
            .and_then(|component| component.as_context_pin_supplier())
            .map(|supplier| supplier.context_inputs())
            .unwrap_or_default();
        match pins.is_empty() {
            true => vec![Pin::exec(DEFAULT_INPUT_PIN)],
            false => pins,
        }
    }

    fn context_outputs(&self, host: &HostServices) -> Vec<Pin> {
        let pins = self
            .expected_component(host)
            .and_then(|component| component.as_context_pin_supplier())
            .map(|supplier| supplier.context_outputs())
            .unwrap_or_default();
        match pins.is_empty() {
            true => vec![Pin::exec(DEFAULT_OUTPUT_PIN)],
            false => pins,
        }
    }

    fn validate(&self, id: NodeId, host: &HostServices, log: &mut ValidationLog) {
        if let ComponentSource::Undetermined = self.source {
            log.error(id, "no component source configured");
            return;
        }
        if host.owner().is_none() {
            log.error(id, "no owner actor to resolve the component on");
            return;
        }
        let Some(component) = self.expected_component(host) else {
            log.error(id, "could not find the component on the owner actor");
            return;
        };
        let mut component = dyn_clone::clone_box(component);
        let capabilities = Capabilities::of(&mut *component);
        if !capabilities.core_executable {
            log.error(id, "the component does not implement `CoreExecutable`");
        }
        if !capabilities.external_executable {
            log.error(id, "the component does not implement `ExternalExecutable`");
        }
    }

    fn initialize_instance(&mut self, ctx: &mut ExecCtx) {
        self.try_inject_component(ctx);
        self.with_core(ctx, |core, cctx| core.initialize_instance(cctx));
    }

    fn pre_deinitialize_instance(&mut self, ctx: &mut ExecCtx) {
        self.with_core(ctx, |core, cctx| core.deinitialize_instance(cctx));
        if self.source.uses_inject_manager() {
            if let Some(mut manager) = self.inject_manager.take() {
                manager.shutdown(ctx.world_mut());
            }
        }
        self.inject_manager = None;
        self.component = None;
        self.capabilities = Capabilities::default();
    }

    fn preload_content(&mut self, ctx: &mut ExecCtx) {
        self.with_core(ctx, |core, cctx| core.preload_content(cctx));
    }

    fn flush_content(&mut self, ctx: &mut ExecCtx) {
        self.with_core(ctx, |core, cctx| core.flush_content(cctx));
    }

    fn on_activate(&mut self, ctx: &mut ExecCtx) {
        let Some(id) = self.ensure_component(ctx) else {
            ctx.log_error("could not activate, the component was missing or could not be resolved");
            return;
        };

        // Pre-activation always precedes activation.
        let external = self.capabilities.external_executable && {
            let (world, mut cctx) = ctx.component_scope();
            match world
                .component_mut(id)
                .and_then(|component| component.as_external_executable())
            {
                Some(external) => {
                    external.pre_activate_external_flow_executable(&mut cctx);
                    true
                }
                None => false,
            }
        };
        if !external {
            ctx.log_error("the component does not implement `ExternalExecutable`");
        }

        if !self.with_core(ctx, |core, cctx| core.on_activate(cctx)) {
            ctx.log_error("the component does not implement `CoreExecutable`");
        }
    }

    fn cleanup(&mut self, ctx: &mut ExecCtx) {
        self.with_core(ctx, |core, cctx| core.cleanup(cctx));
    }

    fn force_finish_node(&mut self, ctx: &mut ExecCtx) {
        self.with_core(ctx, |core, cctx| core.force_finish_node(cctx));
    }

    fn execute_input(&mut self, ctx: &mut ExecCtx, pin: &str) {
        if !self.with_core(ctx, |core, cctx| core.execute_input(cctx, pin)) {
            ctx.log_error(format!(
                "could not execute input `{pin}`, the component was missing or could not be resolved"
            ));
        }
        ctx.trigger_default_output();
    }
}

impl fmt::Debug for ComponentSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComponentSource::Undetermined => f.write_str("Undetermined"),
            ComponentSource::BindToExisting(name) => {
                f.debug_tuple("BindToExisting").field(name).finish()
            }
            ComponentSource::InjectFromTemplate(template) => f
                .debug_tuple("InjectFromTemplate")
                .field(&template.class())
                .finish(),
            ComponentSource::InjectFromClass {
                class,
                reuse_existing,
                allow_inject,
            } => f
                .debug_struct("InjectFromClass")
                .field("class", class)
                .field("reuse_existing", reuse_existing)
                .field("allow_inject", allow_inject)
                .finish(),
        }
    }
}

impl fmt::Debug for ExecuteComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExecuteComponent")
            .field("source", &self.source)
            .field("component", &self.component)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
