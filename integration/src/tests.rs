//! Integration tests for the upgradeable proxy

mod upgrade;
