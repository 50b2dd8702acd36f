pub mod args;
pub mod config;
pub mod driver;
pub mod extract;
pub mod logging;
pub mod report;
pub mod selectors;
pub mod session;
pub mod theme;
pub mod workflow;

// Re-export the types the binary and the test suite touch most.
pub use config::{Config, Credentials};
pub use driver::{PageDriver, StepError};
pub use workflow::RunOutcome;
