//! Columnar batch carrier for the partition state engine.
//!
//! Log-tail payloads arrive as wire batches; the engine decodes them once
//! into [`Batch`] and keeps the decoded columns alive through `Arc`
//! references held by row versions, so reads can fetch column values
//! lazily without copying the payload per row.

pub mod batch;
pub mod vector;

pub use batch::{Batch, WireBatch, WireColumn};
pub use vector::{NullMask, Vector, VectorData};
