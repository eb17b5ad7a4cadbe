pub mod handlers;
pub mod routes;
pub mod solve_handlers;

pub use handlers::*;
pub use routes::*;
pub use solve_handlers::*;
