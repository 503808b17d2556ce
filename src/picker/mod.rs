//! Collaborators that find, parse and group test files, plus the workspace
//! configuration that drives them.

mod finder;
mod parser;
pub mod toml;
mod workdir;

pub use finder::{GlobFinder, TestFinder};
pub use parser::{line_range, position_at, MochaParser, SourceParser, TestEntryPoint};
pub use workdir::{ConfigWorkingDirectory, WorkingDirectory, TS_CONFIG};
