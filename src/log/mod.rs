//! The log engine. A log is a flat UTF-8 text file with one tracked interval
//! per line:
//!
//! ```text
//! + 2024-01-01 09:00:00.0000+0000 2024-01-01 09:25:00.0000+0000 write spec
//! ```
//!
//! [record] owns the line codec, [store] the file-backed record set, and
//! [score] the daily point overlay.

pub mod record;
pub mod score;
pub mod store;
pub mod timefmt;
