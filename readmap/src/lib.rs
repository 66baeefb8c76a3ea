//! Streams basecalled reads through a reference index and reunites each
//! answer with the record that asked for it.

pub mod aligner;
pub mod argv;
pub mod config;
pub mod correlation;
pub mod error;
pub mod index;
pub mod io;
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

pub use aligner::{Aligner, MapReads};
pub use argv::{to_argv, ArgValue};
pub use config::AlignerOpts;
pub use error::AlignError;
pub use index::{build_thread_pool, FromArgs, Index};
pub use io::LogTarget;
pub use record::{Alignment, AlignmentData, Answer, Query, ResultRecord};
