//! Effects the core asks the shell to perform.
//!
//! Render comes straight from Crux. `Portal` carries every call to the
//! reporting backend and `Delay` is the one-shot timer used after a
//! successful submission.

mod delay;
mod portal;

pub use self::delay::{Delay, DelayOperation};
pub use self::portal::{
    EvidenceUpload, Portal, PortalError, PortalOperation, PortalOutput, PortalResult,
};

pub use crux_core::render::Render;
