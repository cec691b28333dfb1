//! Moving finished trailers into the library and cleaning up after downloads.
//!
//! Moves try an atomic rename first and fall back to copy + remove when the
//! temp directory lives on another filesystem than the library.

mod error;
mod fs;

pub use error::PlacerError;
pub use fs::{cleanup_temp, move_into_place, remove_file_if_exists, remove_if_empty};
