pub mod session_flow;

pub use session_flow::SessionFlow;
