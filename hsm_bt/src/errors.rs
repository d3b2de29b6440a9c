//! Contract violations. Every variant here is fatal: per this crate's error
//! handling design there is no recoverable path once one of these fires, so
//! most are raised as panics (see [`crate::hsm::Hsm::dispatch`] and friends)
//! and this enum mainly exists to give the handful of fallible *setup-time*
//! registry lookups a typed `Result`.
use thiserror::Error;

pub type HsmResult<T> = std::result::Result<T, HsmError>;

#[derive(Error, Debug)]
pub enum HsmError {
    #[error("hierarchy depth exceeded the configured maximum of {0}")]
    HierarchyDepthExceeded(u8),
    #[error("dispatch called while a dispatch into this hsm was already in progress")]
    ReentrantDispatch,
    #[error("state handler returned TRAN_REDISPATCH twice in a row for the same event")]
    DoubleRedispatch,
    #[error("transition target must not be the top pseudostate")]
    TransitionToTop,
    #[error("state handler answered SUPER to something other than the EMPTY event")]
    SuperOutsideEmpty,
    #[error("ctor was never called on this hsm before this operation")]
    NotConstructed,
    #[error("init was never called on this hsm before dispatch")]
    NotInitialized,
    #[error("no am_bt_cfg registered for this hsm")]
    NoRegisteredCfg,
    #[error("no superstate registered for bt node {kind} instance {instance}")]
    NoSuperstate { kind: &'static str, instance: u8 },
    #[error("a BT composite observed more completion signals than it has children")]
    UnexpectedCompletion,
}
