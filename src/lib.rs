// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # airwatch
//!
//! A live terminal monitor and library for air quality sensor data arriving
//! over a serial connection.
//!
//! The sensor bridge (an Arduino carrying a particulate and a CO₂/RH/T
//! sensor) emits one comma-separated record per line. This crate ingests
//! that stream, keeps a bounded sliding window of recent samples per metric,
//! and materializes consistent snapshots on a fixed cadence for display or
//! export.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│ snapshot │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │ (watch)  │    │(charts) │    │         │  │
//! │  └────┬────┘    └────▲─────┘    └─────────┘    └─────────┘  │
//! │       │              │ tick                                  │
//! │       ▼              │                                       │
//! │  ┌──────────────────────────────────────────────┐           │
//! │  │ pipeline: source ▶ framer ▶ parser ▶ windows │           │
//! │  └───▲──────────────────────────────────────────┘           │
//! │      │                                                       │
//! │      └── SerialSource | ReplaySource                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: byte source abstraction ([`ByteSource`] trait) with a
//!   live serial implementation and a capture replay for offline use
//! - **[`framer`]**: accumulates raw chunks into complete text lines,
//!   filtering comments and blanks at the framing level
//! - **[`data`]**: the [`Metric`] set, tolerant record parsing, window
//!   buffers, and snapshot types
//! - **[`pipeline`]**: the ingest poll loop and the snapshot timer task,
//!   sharing only the window buffers
//! - **[`app`]** / **[`ui`]**: TUI state and ratatui rendering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Monitor a live serial port
//! airwatch /dev/ttyUSB0
//!
//! # Replay a recorded capture without hardware
//! airwatch --replay capture.txt
//!
//! # Print one JSON summary per tick instead of the TUI
//! airwatch /dev/ttyUSB0 --headless
//! ```
//!
//! ### As a library
//!
//! ```
//! use airwatch::{Metric, MonitorConfig, Pipeline, ReplaySource};
//!
//! # tokio_test::block_on(async {
//! let config = MonitorConfig::default();
//! let source = ReplaySource::from_bytes(&b"12.3,410,21.5,45.0\n"[..], "demo");
//!
//! let handle = Pipeline::new(Box::new(source), &config).spawn();
//! handle.wait_terminated().await;
//!
//! let snapshot = handle.snapshot_now();
//! assert_eq!(snapshot.metric(Metric::Co2).unwrap().values, vec![410.0]);
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod framer;
pub mod pipeline;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{MonitorConfig, DEFAULT_BAUD_RATE, DEFAULT_TICK_PERIOD_MS};
pub use data::{
    parse_line, Metric, MetricSeries, ParseOutcome, Reading, Snapshot, WindowBuffer,
    DEFAULT_WINDOW_CAPACITY,
};
pub use error::SourceError;
pub use framer::LineFramer;
pub use pipeline::{IngestStats, Pipeline, PipelineHandle, PipelineState, SharedWindows};
pub use source::{ByteSource, ReplaySource, SerialSource};
