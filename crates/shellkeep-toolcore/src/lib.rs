//! Tool abstraction shared by the shell tools and the command-line host.

pub mod tool;
pub mod tool_context;
pub mod tool_registry;

pub use tool::*;
pub use tool_context::*;
pub use tool_registry::*;
