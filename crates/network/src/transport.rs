//! The seam between the synchronization engine and the wire

use crate::endpoint::{Endpoint, ServerAddress};
use crate::error::NetworkResult;
use futures::future::BoxFuture;

/// Performs one protocol call and yields the raw response body
///
/// Implementations only move bytes; interpreting the `err` envelope and
/// decoding the payload happens in [`crate::protocol`]. Dropping the
/// returned future abandons the request.
pub trait Transport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        address: &'a ServerAddress,
        endpoint: &'a Endpoint,
    ) -> BoxFuture<'a, NetworkResult<String>>;
}
