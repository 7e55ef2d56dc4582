//! Constants used in the integration tests

/// The number of accounts the tests run with: an admin & an attacker
pub(crate) const NUM_TEST_ACCOUNTS: usize = 2;

/// The upper bound (exclusive) on random values written through the proxy
pub(crate) const MAX_TEST_VALUE: u64 = 1 << 32;
