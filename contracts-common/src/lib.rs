//! Common modules used throughout the project, including the scripts & integration tests

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod constants;
pub mod proxy;
