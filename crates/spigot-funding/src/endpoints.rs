//! The endpoint pool: an ordered list of interchangeable RPC endpoints
//! with a rotation cursor.
//!
//! The cursor is shared by every component issuing network calls through
//! the same client, so a failure seen by one call moves the whole process
//! onto the next endpoint. Entries are never removed, only rotated past.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmptyEndpointList;

/// Ordered endpoint list plus the process-wide rotation cursor.
///
/// The cursor is an atomic so the pool can be shared behind an `Arc`
/// without interior `Mutex`. Relaxed ordering suffices: the cursor is a
/// failover hint, not a synchronization point.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<String>,
    cursor: AtomicUsize,
}

impl EndpointPool {
    /// Build a pool from an ordered, non-empty endpoint list.
    pub fn new(endpoints: Vec<String>) -> Result<Self, EmptyEndpointList> {
        if endpoints.is_empty() {
            return Err(EmptyEndpointList);
        }
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    /// The currently selected endpoint and its index.
    pub fn current(&self) -> (usize, &str) {
        let index = self.cursor.load(Ordering::Relaxed) % self.endpoints.len();
        (index, &self.endpoints[index])
    }

    /// Advance the cursor to the next endpoint, wrapping, and return it.
    pub fn rotate(&self) -> &str {
        let next = (self.cursor.load(Ordering::Relaxed) + 1) % self.endpoints.len();
        self.cursor.store(next, Ordering::Relaxed);
        &self.endpoints[next]
    }

    /// Cursor position, for diagnostics and tests.
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Relaxed) % self.endpoints.len()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.endpoints
    }
}
