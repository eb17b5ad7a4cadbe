pub mod compute_client;
pub mod forwarder;
pub mod input_tree;
pub mod mock_compute;
pub mod retry;
pub mod status_probe;

pub use compute_client::{ComputeClient, Endpoint, HttpComputeClient};
pub use forwarder::{SolveForwarder, SolveOutcome};
pub use input_tree::build_input_tree;
pub use retry::RetryPolicy;
pub use status_probe::StatusProbe;
