// Request transformation pipeline.
// inbound JSON → escape_markup → normalize_keys → SchemaValidator → build_context.
// The format adapter feeds parser output into the same path.
// Everything here is pure and synchronous; no I/O.

pub mod adapter;
pub mod context;
pub mod escape;
pub mod keys;
pub mod schema;

pub use adapter::{generator_to_parser, parser_to_generator};
pub use context::{build_context, ContextOptions, RenderingContext};
pub use escape::escape_markup;
pub use keys::normalize_keys;
pub use schema::{FieldError, SchemaValidator};
