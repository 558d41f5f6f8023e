//! Core request types and process state.

mod context;
mod state;

pub use context::{
    CRITICAL_SCRIPTS, CRITICAL_STYLES, ClientContext, ConnectionHint, DeviceClass,
    ImageDescriptor, ImageFormat, PRIORITY_HANDLES, ResourceDescriptor, ResourceKind, UserId,
};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
