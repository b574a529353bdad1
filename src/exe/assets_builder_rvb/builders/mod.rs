mod descriptor_builder;
pub use descriptor_builder::*;
