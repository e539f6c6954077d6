//! Application layer for Inkwell
//!
//! Pure session state machine and generic runtime for one chat view,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`Session`]: connection manager (transcript, statuses, send gating)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod driver;
mod error;
mod event;
mod runtime;
mod session;
mod state;

pub use action::SessionAction;
pub use config::SessionConfig;
pub use driver::Driver;
pub use error::SendRejected;
pub use event::SessionEvent;
pub use runtime::Runtime;
pub use session::{MALFORMED_FRAME_NOTICE, SEND_FAILED_NOTICE, Session, UNMOUNT_REASON};
pub use state::{Message, MessageMetadata, ProcessingStatus, Role, SessionSnapshot};
