//! Admin tools for shatter - TCP server for remote inspection and control
//!
//! Start the admin server from the host:
//! ```ignore
//! let handler = Arc::new(Mutex::new(MyHandler::new()));
//! let _server = AdminServer::start(handler, shatter_admin::DEFAULT_PORT);
//! ```

pub mod protocol;
pub mod server;

pub use protocol::*;
pub use server::{AdminHandler, AdminServer};

/// Default admin server port
pub const DEFAULT_PORT: u16 = 9743;
