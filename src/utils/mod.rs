//! Utility modules shared by the rewriters and the host server.

pub mod html;
pub mod mime;
pub mod path;
