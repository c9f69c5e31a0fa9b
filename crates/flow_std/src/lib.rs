//! A library of standard nodes for flow.

pub use constant::Constant;
pub use format_text::FormatText;
pub use crate::log::Log;
pub use notify::NotifyActor;
pub use reroute::Reroute;

pub mod constant;
pub mod format_text;
pub mod log;
pub mod notify;
pub mod reroute;
