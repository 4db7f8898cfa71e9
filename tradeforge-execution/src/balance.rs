use crate::ExecutionError;
use derive_more::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tradeforge_instrument::{asset::Asset, fixed::Amount};
use tracing::debug;

/// Unique account `String` identifier.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct AccountId(pub SmolStr);

impl AccountId {
    pub fn new<S>(id: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self(id.into())
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Free and locked balance of one currency.
///
/// Both components are non-negative by construction.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct Balance {
    pub free: Amount,
    pub locked: Amount,
}

impl Balance {
    pub fn total(&self) -> Amount {
        // free + locked fits: both halves originate from checked deposits
        Amount::from_raw(self.free.raw() + self.locked.raw())
    }
}

/// Account service owning every [`Balance`] map; the only mutation path for balances.
///
/// All operations are checked: nothing here can drive a balance negative.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Accounts {
    accounts: IndexMap<AccountId, IndexMap<Asset, Balance>>,
}

impl Accounts {
    /// Credit `amount` to the free balance, creating the account/currency as needed.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        let balance = self.balance_entry(account, currency);
        balance.free = balance.free.checked_add(amount)?;
        Ok(*balance)
    }

    /// Debit `amount` from the free balance.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        self.debit_free(account, currency, amount)
    }

    /// Move `amount` from free into locked.
    pub fn lock(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        let have = self.balance(account, currency).free;
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                account: account.clone(),
                currency: currency.clone(),
                need: amount,
                have,
            });
        }

        let balance = self.balance_entry(account, currency);
        balance.free = balance.free.checked_sub(amount)?;
        balance.locked = balance.locked.checked_add(amount)?;
        Ok(*balance)
    }

    /// Move `amount` from locked back into free.
    pub fn unlock(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        let have = self.balance(account, currency).locked;
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                account: account.clone(),
                currency: currency.clone(),
                need: amount,
                have,
            });
        }

        let balance = self.balance_entry(account, currency);
        balance.locked = balance.locked.checked_sub(amount)?;
        balance.free = balance.free.checked_add(amount)?;
        Ok(*balance)
    }

    /// Consume `amount` from the locked balance as a realized outflow.
    pub fn spend_locked(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        let have = self.balance(account, currency).locked;
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                account: account.clone(),
                currency: currency.clone(),
                need: amount,
                have,
            });
        }

        let balance = self.balance_entry(account, currency);
        balance.locked = balance.locked.checked_sub(amount)?;
        Ok(*balance)
    }

    /// Debit a fee from the free balance.
    pub fn debit_fee(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        if amount.is_zero() {
            return Ok(self.balance(account, currency));
        }
        debug!(%account, %currency, %amount, "debiting fee");
        self.debit_free(account, currency, amount)
    }

    /// Current [`Balance`] of the account/currency; zero when unknown.
    pub fn balance(&self, account: &AccountId, currency: &Asset) -> Balance {
        self.accounts
            .get(account)
            .and_then(|balances| balances.get(currency))
            .copied()
            .unwrap_or_default()
    }

    /// Iterate every account with its balances, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &IndexMap<Asset, Balance>)> {
        self.accounts.iter()
    }

    fn debit_free(
        &mut self,
        account: &AccountId,
        currency: &Asset,
        amount: Amount,
    ) -> Result<Balance, ExecutionError> {
        let have = self.balance(account, currency).free;
        if have < amount {
            return Err(ExecutionError::InsufficientBalance {
                account: account.clone(),
                currency: currency.clone(),
                need: amount,
                have,
            });
        }

        let balance = self.balance_entry(account, currency);
        balance.free = balance.free.checked_sub(amount)?;
        Ok(*balance)
    }

    fn balance_entry(&mut self, account: &AccountId, currency: &Asset) -> &mut Balance {
        self.accounts
            .entry(account.clone())
            .or_default()
            .entry(currency.clone())
            .or_default()
    }
}
