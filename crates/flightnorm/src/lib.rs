//! `flightnorm` - Flight-plan message normalizer
//!
//! Turns loosely formatted SHR/DEP/ARR flight-plan messages into structured
//! [`FlightRecord`]s: identifier, vehicle type, start and end times, start and
//! end positions, and a fingerprint for deduplication.
//!
//! ```
//! use flightnorm::{normalize, FlightMessage};
//!
//! let message = FlightMessage::new(
//!     Some("-DOF/250101 REG/FL999"),
//!     Some("-ATD 0705 -ADEPZ 5957N02905E"),
//!     Some("-ATA 1636 -ADARRZ 5957N02905E"),
//! );
//! let record = normalize(&message);
//! assert_eq!(record.identifier.as_deref(), Some("FL999"));
//! assert_eq!(record.duration_seconds, Some(34_260));
//! // DOF is day-month-year: 25 January 2001
//! assert_eq!(
//!     record.start_time.map(|t| t.to_rfc3339()).as_deref(),
//!     Some("2001-01-25T07:05:00+00:00")
//! );
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fingerprint;
pub mod ingest;
pub mod logging;
pub mod message;
pub mod metrics;
pub mod normalizer;
pub mod record;

pub use config::Config;
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use logging::init_logging;
pub use message::FlightMessage;
pub use normalizer::{normalize, Coordinate, Normalizer};
pub use record::FlightRecord;
