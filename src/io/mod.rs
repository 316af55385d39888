//! Input/output helpers.
//!
//! - CSV / manual-table ingest (`ingest`)
//! - per-point result export (CSV) (`export`)
//! - saved fit read/write (JSON) (`result_file`)

pub mod export;
pub mod ingest;
pub mod result_file;

pub use export::*;
pub use result_file::*;
