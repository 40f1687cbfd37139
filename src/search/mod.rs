//! `#github` repository search command.

pub mod client;
pub mod command;

pub use client::GitHubSearch;
pub use command::{parse_command, SearchCommand, SearchMode};
