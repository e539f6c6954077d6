//! Terminal front-end for Inkwell article chat.
//!
//! A thin host over [`inkwell_client::WsDriver`]: stdin lines become session
//! commands and rendered snapshots are printed as plain text. All
//! orchestration lives in the generic [`inkwell_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod host;
pub mod printer;

pub use command::{Command, parse_line};
pub use printer::Printer;
