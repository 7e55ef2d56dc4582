//! Names shared between the Cairo contracts and the Rust code interacting with them

/// The name of the Scarb package in which the contracts are defined.
/// Scarb prefixes every contract artifact with it.
pub const PACKAGE_NAME: &str = "upgradeable_proxy";

/// The name of the proxy contract
pub const PROXY_CONTRACT_NAME: &str = "Proxy";

/// The name of the initial implementation contract
pub const IMPLEMENTATION_V0_CONTRACT_NAME: &str = "ImplementationV0";

/// The name of the upgraded implementation contract
pub const IMPLEMENTATION_V1_CONTRACT_NAME: &str = "ImplementationV1";

/// The implementation entry point the proxy constructor library-calls into
pub const INITIALIZER_FN_NAME: &str = "initializer";

/// Returns the proxy admin
pub const GET_ADMIN_FN_NAME: &str = "get_admin";

/// Returns the class hash the proxy currently delegates to
pub const GET_IMPLEMENTATION_HASH_FN_NAME: &str = "get_implementation_hash";

/// Replaces the class hash the proxy delegates to, admin only
pub const UPGRADE_FN_NAME: &str = "upgrade";

/// Writes the first stored value
pub const SET_VALUE_1_FN_NAME: &str = "set_value_1";

/// Reads the first stored value
pub const GET_VALUE_1_FN_NAME: &str = "get_value_1";

/// Writes the second stored value
pub const SET_VALUE_2_FN_NAME: &str = "set_value_2";

/// Reads the second stored value.
///
/// This is the entry point whose result differs between implementation versions:
/// `ImplementationV0` returns the stored value as is while `ImplementationV1` adds one to it.
pub const GET_VALUE_2_FN_NAME: &str = "get_value_2";
