//! Scripts for deploying, exercising & upgrading the upgradeable proxy contracts on Starknet

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod accounts;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod contract;
pub mod devnet;
pub mod errors;
