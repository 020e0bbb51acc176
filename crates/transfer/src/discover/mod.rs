//! Enumeration of the files under an upload root.
//!
//! The walk is iterative (an explicit stack of directories), streams results
//! as soon as they are found, and never follows symbolic links. Version
//! control internals and other [`Exclusions`] are pruned during the walk
//! rather than filtered afterwards, so excluded trees are never read.

pub mod error;
mod file;
mod stream;

pub use self::file::{DiscoveredFile, Exclusions};
pub use self::stream::{discover, discover_all};
