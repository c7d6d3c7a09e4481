pub mod attributes;
pub mod node;

pub use attributes::*;
pub use node::*;
