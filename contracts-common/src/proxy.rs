//! A reference model of the proxy's admin-gated upgrade logic.
//!
//! The on-chain proxy holds exactly one implementation class hash and one admin address.
//! [`ProxyState`] mirrors the transitions the contracts allow on those two values, so that
//! the behavior observed on-chain can be checked against what should have happened.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use starknet_core::types::Felt;

/// Errors that can occur when transitioning the proxy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// The caller of an upgrade is not the proxy admin
    Unauthorized {
        /// The account that attempted the upgrade
        caller: Felt,
        /// The admin recorded at initialization
        admin: Felt,
    },
    /// The proxy admin has already been set
    AlreadyInitialized,
    /// The proxy admin has not been set yet
    NotInitialized,
    /// The zero address cannot be the proxy admin
    ZeroAdmin,
}

impl Display for ProxyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Unauthorized { caller, admin } => write!(
                f,
                "caller {:#064x} is not the proxy admin {:#064x}",
                caller, admin
            ),
            ProxyError::AlreadyInitialized => write!(f, "proxy already initialized"),
            ProxyError::NotInitialized => write!(f, "proxy not initialized"),
            ProxyError::ZeroAdmin => write!(f, "proxy admin cannot be zero"),
        }
    }
}

impl Error for ProxyError {}

/// A contract whose logic can be swapped out by a privileged account
pub trait Upgradable {
    /// The account allowed to upgrade the contract, if one has been set
    fn admin(&self) -> Option<Felt>;

    /// The class hash that calls are currently delegated to
    fn current_implementation(&self) -> Felt;

    /// Point the contract at `new_implementation`, on behalf of `caller`.
    ///
    /// Fails without changing any state unless `caller` is the admin.
    fn upgrade(&mut self, caller: Felt, new_implementation: Felt) -> Result<(), ProxyError>;
}

/// The state of a proxy contract: its implementation pointer and its admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyState {
    /// The class hash of the current implementation
    implementation: Felt,
    /// The proxy admin, set once by the initializer
    admin: Option<Felt>,
}

impl ProxyState {
    /// A freshly deployed proxy pointing at `implementation`, with no admin yet
    pub fn new(implementation: Felt) -> Self {
        Self {
            implementation,
            admin: None,
        }
    }

    /// Record the proxy admin. This can only happen once.
    pub fn initialize(&mut self, admin: Felt) -> Result<(), ProxyError> {
        if self.admin.is_some() {
            return Err(ProxyError::AlreadyInitialized);
        }
        if admin == Felt::ZERO {
            return Err(ProxyError::ZeroAdmin);
        }

        self.admin = Some(admin);
        Ok(())
    }
}

impl Upgradable for ProxyState {
    fn admin(&self) -> Option<Felt> {
        self.admin
    }

    fn current_implementation(&self) -> Felt {
        self.implementation
    }

    fn upgrade(&mut self, caller: Felt, new_implementation: Felt) -> Result<(), ProxyError> {
        let admin = self.admin.ok_or(ProxyError::NotInitialized)?;
        if caller != admin {
            return Err(ProxyError::Unauthorized { caller, admin });
        }

        self.implementation = new_implementation;
        Ok(())
    }
}

/// What an observer sees after attempting an upgrade on-chain
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The upgrade transaction was accepted and executed successfully
    Applied,
    /// The upgrade transaction was rejected before inclusion, or reverted
    Rejected(String),
}

impl UpgradeOutcome {
    /// Whether the upgrade took effect
    pub fn is_applied(&self) -> bool {
        matches!(self, UpgradeOutcome::Applied)
    }

    /// Whether this outcome is the one the reference model predicted
    pub fn agrees_with(&self, predicted: &Result<(), ProxyError>) -> bool {
        self.is_applied() == predicted.is_ok()
    }
}

impl Display for UpgradeOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeOutcome::Applied => write!(f, "applied"),
            UpgradeOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{thread_rng, Rng};
    use starknet_core::types::Felt;

    use super::{ProxyError, ProxyState, Upgradable, UpgradeOutcome};

    /// A random, non-zero felt
    fn random_felt() -> Felt {
        Felt::from(thread_rng().gen::<u64>() | 1)
    }

    /// A proxy with a random implementation & admin, returned alongside both
    fn initialized_proxy() -> (ProxyState, Felt, Felt) {
        let implementation = random_felt();
        let admin = random_felt();
        let mut proxy = ProxyState::new(implementation);
        proxy.initialize(admin).unwrap();
        (proxy, implementation, admin)
    }

    #[test]
    fn test_initialize_sets_admin() {
        let (proxy, implementation, admin) = initialized_proxy();
        assert_eq!(proxy.admin(), Some(admin));
        assert_eq!(proxy.current_implementation(), implementation);
    }

    #[test]
    fn test_initialize_only_once() {
        let (mut proxy, _, admin) = initialized_proxy();
        let other = admin + Felt::ONE;

        assert_eq!(proxy.initialize(other), Err(ProxyError::AlreadyInitialized));
        assert_eq!(proxy.admin(), Some(admin));
    }

    #[test]
    fn test_zero_admin_rejected() {
        let mut proxy = ProxyState::new(random_felt());
        assert_eq!(proxy.initialize(Felt::ZERO), Err(ProxyError::ZeroAdmin));
        assert_eq!(proxy.admin(), None);
    }

    #[test]
    fn test_upgrade_before_initialization() {
        let implementation = random_felt();
        let mut proxy = ProxyState::new(implementation);

        assert_eq!(
            proxy.upgrade(random_felt(), random_felt()),
            Err(ProxyError::NotInitialized)
        );
        assert_eq!(proxy.current_implementation(), implementation);
    }

    #[test]
    fn test_admin_upgrade_applies() {
        let (mut proxy, implementation, admin) = initialized_proxy();
        let new_implementation = implementation + Felt::ONE;

        proxy.upgrade(admin, new_implementation).unwrap();
        assert_eq!(proxy.current_implementation(), new_implementation);
    }

    #[test]
    fn test_unauthorized_upgrade_leaves_pointer() {
        let (mut proxy, implementation, admin) = initialized_proxy();
        let upgraded = implementation + Felt::ONE;
        proxy.upgrade(admin, upgraded).unwrap();

        let attacker = admin + Felt::TWO;
        let res = proxy.upgrade(attacker, implementation);

        assert_eq!(
            res,
            Err(ProxyError::Unauthorized {
                caller: attacker,
                admin
            })
        );
        // The pointer is still the one from the last successful upgrade
        assert_eq!(proxy.current_implementation(), upgraded);
    }

    #[test]
    fn test_repeated_upgrade_is_idempotent() {
        let (mut proxy, implementation, admin) = initialized_proxy();
        let target = implementation + Felt::ONE;

        proxy.upgrade(admin, target).unwrap();
        let after_first = proxy;
        proxy.upgrade(admin, target).unwrap();

        assert_eq!(proxy, after_first);
    }

    #[test]
    fn test_outcome_agreement() {
        let (mut proxy, implementation, admin) = initialized_proxy();

        let authorized = proxy.upgrade(admin, implementation + Felt::ONE);
        assert!(UpgradeOutcome::Applied.agrees_with(&authorized));
        assert!(!UpgradeOutcome::Rejected("reverted".to_string()).agrees_with(&authorized));

        let unauthorized = proxy.upgrade(admin + Felt::ONE, implementation);
        assert!(UpgradeOutcome::Rejected("reverted".to_string()).agrees_with(&unauthorized));
        assert!(!UpgradeOutcome::Applied.agrees_with(&unauthorized));
    }
}
