// Service exports
pub mod dispatch;
pub mod oracle;

pub use dispatch::{DispatchClient, DispatchError, DispatchSink};
pub use oracle::{GeminiOracle, Oracle, OracleError};
