mod counter;
mod error;
mod orderer;

pub use counter::AtomicCounter;
pub use error::EngineError;
pub use orderer::{OperationOrderer, Status};
