//! Step parameter templates
//!
//! Each workflow step renders a handlebars template into the free-text
//! parameters handed to its capability endpoint. Templates are embedded
//! with an optional user override directory.

mod embedded;
mod loader;

pub use loader::PromptLoader;
