pub mod aggregate;
pub mod ast;
pub mod compdb;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod identifiers;
pub mod logging;
pub mod path;
pub mod report;
pub mod splitter;
pub mod walker;

pub use error::Result;
