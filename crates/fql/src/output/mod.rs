//! Output formatting utilities for the fql CLI.
//!
//! - [`diagnostic`] - Query text with a caret under the offending column
//! - [`introspection`] - Searchable fields as a text listing

mod diagnostic;
mod introspection;

pub use diagnostic::render_caret;
pub use introspection::format_introspection;
