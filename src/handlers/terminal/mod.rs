//! Built-in handler modules
//!
//! Each submodule is authored independently and exposes a `MODULE` registry
//! entry. Adding a handler means adding a file here and listing it below.

pub mod feedback;
pub mod feedback_reply;
pub mod greeting;
pub mod start;

use super::registry::HandlerModule;

/// Registry of built-in handler modules, in load order
pub fn modules() -> Vec<HandlerModule> {
    vec![start::MODULE, feedback::MODULE, feedback_reply::MODULE, greeting::MODULE]
}
