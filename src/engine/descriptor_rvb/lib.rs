pub mod wire;

mod rewrite;
pub use rewrite::*;

mod schema;
pub use schema::*;

mod compiler;
pub use compiler::*;

mod registry;
pub use registry::*;
