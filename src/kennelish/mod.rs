//! Kennelish form engine
//!
//! A form step is an ordered JSON tree of schema nodes. The read path
//! renders it against a member record; the write path compiles it into a
//! validator, regroups dotted keys and merges the result onto the record.

pub mod loader;
pub mod reconcile;
pub mod render;
pub mod schema;
pub mod validate;

pub use loader::FormLoader;
pub use reconcile::{merge, normalize, reconcile, FormRecord};
pub use render::{lookup, render, RenderError};
pub use schema::SchemaNode;
pub use validate::{compile, Constraint, FieldError, ValidationErrors, ValidatorSpec};
