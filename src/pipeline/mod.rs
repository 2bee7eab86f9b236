pub mod node;
pub mod wire;

pub use node::*;
pub use wire::*;
