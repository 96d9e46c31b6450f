//! Race protocol plumbing: endpoints, the transport seam and response decoding
//!
//! All calls are `GET` with `json=1` plus endpoint parameters, and every
//! response is a JSON object that is either a payload or an `err` document.

mod client;
mod endpoint;
mod error;
pub mod protocol;
mod transport;

pub use client::{Client, ClientConfig};
pub use endpoint::{Endpoint, ServerAddress, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{NetworkError, NetworkResult};
pub use protocol::{decode, parse_document, ErrorCode};
pub use transport::Transport;
