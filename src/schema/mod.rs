//! Health dataset input schema
//!
//! This module defines the time-series payload returned by the health-data API
//! (one dataset per metric source) and the adapter that turns it into
//! [`RawSample`](crate::types::RawSample)s.

mod adapter;
mod dataset;

pub use adapter::*;
pub use dataset::*;
