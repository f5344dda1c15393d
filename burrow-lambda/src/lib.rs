//! Function service core (spec §4.6, §4.7): function metadata, per-function
//! installation lifecycle, and invocation dispatch. The HTTP surface lives
//! in `burrow-lambda-http`.

pub mod error;
pub mod installation;
pub mod lease;
pub mod manager;
pub mod properties;

pub use error::Error;
pub use installation::{FunctionInstallation, InvokeOutcome};
pub use lease::{LeasePool, ResultLogLease};
pub use manager::{FunctionManager, InvocationResult, ManagerConfig};
pub use properties::FunctionProperties;

pub type Result<T> = std::result::Result<T, Error>;
