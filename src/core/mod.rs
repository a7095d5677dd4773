//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{CvFile, CvSeries, HeaderBlock, LoaderError};
pub use transforms::{find_last_round, LastRound, RoundWindow, TransformError};
pub use writers::{last_round_path, write_last_round, WriteError};
