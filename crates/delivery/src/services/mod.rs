//! External collaborator interfaces.

pub mod driver;
pub mod http;

pub use driver::{DriverAssignment, DriverAssignmentClient, InMemoryDriverClient};
pub use http::HttpDriverClient;
