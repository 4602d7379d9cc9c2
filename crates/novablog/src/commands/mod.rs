//! CLI subcommands.

pub mod export;
pub mod init;
pub mod query;
pub mod serve;
