//! Command-line interface module.

mod args;
pub mod classify;
mod common;
pub mod minify;
pub mod optimize;

pub use args::{Cli, Commands, MinifyArgs, OptimizeArgs};
