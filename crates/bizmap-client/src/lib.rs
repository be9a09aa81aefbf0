//! HTTP access to the business directory API.

pub mod client;
pub mod error;
pub(crate) mod retry;

pub use client::DirectoryClient;
pub use error::DirectoryError;
