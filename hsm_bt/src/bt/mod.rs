//! Behavior-tree decorators and composites, realized as ordinary HSM
//! states. Every node in this module shares the engine's own
//! `fn(&mut C, &Event) -> StateResult<C>` signature, which is what lets a
//! decorator wrap any substate (another BT node or a plain leaf state)
//! without the engine knowing BT nodes are anything special.
pub mod nodes;
pub mod registry;

pub use nodes::*;
pub use registry::{BtNodeKind, BtRegistry};
