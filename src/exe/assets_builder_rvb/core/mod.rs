mod asset_builder;
pub use asset_builder::*;
mod assets_builder;
pub use assets_builder::*;

mod scan;
pub use scan::*;
