//! The entity lifecycle engine and its result decoration.

pub mod decorator;
pub mod manager;

pub use decorator::validated_header;
pub use manager::{EntityLifecycleManager, LockAction};
