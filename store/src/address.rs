//! Account balance index.

use crate::StoreError;
use xdag_types::{AccountId, XAmount};

/// Balances of plain accounts, the address-form link targets.
pub trait AddressStore: Send + Sync {
    /// Balance of `account`; zero when unknown.
    fn balance_of(&self, account: &AccountId) -> Result<XAmount, StoreError>;

    /// Overwrite the balance of `account`, creating it if needed.
    fn update_balance(&self, account: &AccountId, balance: XAmount) -> Result<(), StoreError>;

    fn address_exists(&self, account: &AccountId) -> Result<bool, StoreError>;

    /// Sum of all account balances.
    fn total_balance(&self) -> Result<XAmount, StoreError>;

    fn set_total_balance(&self, total: XAmount) -> Result<(), StoreError>;
}
