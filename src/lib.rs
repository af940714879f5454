pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod output;
pub mod processing;
pub mod server;
pub mod template;
pub mod tools;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
