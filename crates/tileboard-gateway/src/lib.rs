//! WebSocket server for the shared pixel canvas.
//!
//! The gateway binds the listener, accepts connections on the `/tile`
//! endpoint, and runs one session per connection. Sessions share a single
//! [`tileboard_canvas::CanvasStore`] and fan snapshots out to each other
//! through it.

pub mod connection;
pub mod server;
pub mod state;

pub use server::start_server;
pub use state::AppState;
