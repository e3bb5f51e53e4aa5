//! CLI command implementations

mod config_gen;
mod user_management;

pub use config_gen::*;
pub use user_management::*;
