/// Errors raised by the operation orderer (C2).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("orderer started before a handler was set")]
    HandlerNotSet,
}
