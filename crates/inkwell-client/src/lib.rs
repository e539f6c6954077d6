//! Inkwell production client.
//!
//! Connects the sans-IO [`inkwell_app::Session`] to the outside world.
//!
//! # Components
//!
//! - [`WsDriver`]: [`inkwell_app::Driver`] implementation multiplexing host
//!   commands, transport events and the reconnect deadline
//! - [`transport`]: one tokio-tungstenite socket per connection attempt
//! - [`loopback`]: in-process assistant for offline use and tests
//! - [`ClientConfig`]: validated host settings
//! - [`SystemEnv`]: real clock and OS randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod driver;
mod error;
pub mod loopback;
mod system_env;
pub mod transport;

pub use config::ClientConfig;
pub use driver::{TransportMode, WsDriver};
pub use error::{ConfigError, DriverError, TransportError};
pub use loopback::LoopbackOptions;
pub use system_env::SystemEnv;
pub use transport::TransportHandle;
