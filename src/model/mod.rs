pub mod definition;
pub mod input;
pub mod status;
pub mod wire;

pub use definition::*;
pub use input::*;
pub use status::*;
pub use wire::*;
