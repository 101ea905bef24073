//! Session data model: records and the registry holding them

pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
pub use session::{
    derive_key, CommandLine, Layout, Orientation, ProcessSlot, Session, SessionKey, SessionState,
    SplitDirection,
};
