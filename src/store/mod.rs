pub mod filesystem;
pub mod solve_cache;
pub mod traits;

pub use filesystem::*;
pub use solve_cache::*;
pub use traits::*;
