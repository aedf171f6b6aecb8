//! Data models for the ingestion pipeline.
//!
//! ## Submodules
//!
//! - [`reading`]: the [`Metric`] set, parsed [`Reading`] records, and the
//!   tolerant line parser
//! - [`window`]: fixed-capacity [`WindowBuffer`] with FIFO eviction
//! - [`snapshot`]: immutable [`Snapshot`] views handed to consumers
//!
//! ## Data Flow
//!
//! ```text
//! "12.3,410,21.5,45.0"        (framed line)
//!        │
//!        ▼
//! parse_line() ──▶ Reading { pm25, co2, temperature, humidity }
//!        │
//!        ▼
//! WindowBuffer::push()        (one buffer per present field)
//!        │
//!        ▼
//! Snapshot                    (per-metric copies + min/max, on each tick)
//! ```

pub mod reading;
pub mod snapshot;
pub mod window;

pub use reading::{parse_line, Metric, ParseOutcome, Reading};
pub use snapshot::{MetricSeries, Snapshot};
pub use window::{WindowBuffer, DEFAULT_WINDOW_CAPACITY};
