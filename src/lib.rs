pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod diff;
pub mod logging;
pub mod rewrite;
pub mod terminal;
pub mod types;
pub mod util;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use diff::{diff_partial_update, DiffError, StreamingDiffRenderer};
