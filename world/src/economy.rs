//! Named currency balances.

use std::collections::BTreeMap;

use path_defence_core::Currency;

/// Ledger of non-negative currency balances.
///
/// Withdrawals saturate at zero instead of failing; callers that need a hard
/// gate compare [`Ledger::balance`] against the price first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<Currency, u64>,
}

impl Ledger {
    /// Creates a ledger seeded with the provided balances.
    #[must_use]
    pub fn with_balances<'a>(balances: impl IntoIterator<Item = &'a (Currency, u64)>) -> Self {
        let mut ledger = Self::default();
        for (currency, amount) in balances {
            let _ = ledger.deposit(currency, *amount);
        }
        ledger
    }

    /// Current balance of a currency; unknown currencies hold zero.
    #[must_use]
    pub fn balance(&self, currency: &Currency) -> u64 {
        self.balances.get(currency).copied().unwrap_or(0)
    }

    /// Adds `amount`, creating the entry if needed, and returns the new balance.
    pub fn deposit(&mut self, currency: &Currency, amount: u64) -> u64 {
        let balance = self.balances.entry(currency.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Subtracts `amount` clamped at zero and returns the new balance.
    pub fn withdraw(&mut self, currency: &Currency, amount: u64) -> u64 {
        let balance = self.balances.entry(currency.clone()).or_insert(0);
        *balance = balance.saturating_sub(amount);
        *balance
    }

    /// Iterates over every tracked balance in currency order.
    pub fn iter(&self) -> impl Iterator<Item = (&Currency, u64)> {
        self.balances
            .iter()
            .map(|(currency, balance)| (currency, *balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdraw_clamps_at_zero() {
        let gold = Currency::gold();
        let mut ledger = Ledger::with_balances(&[(gold.clone(), 50)]);

        assert_eq!(ledger.withdraw(&gold, 1_000_000_000), 0);
        assert_eq!(ledger.balance(&gold), 0);
    }

    #[test]
    fn deposit_creates_missing_currencies() {
        let gems = Currency::new("gems");
        let mut ledger = Ledger::default();

        assert_eq!(ledger.balance(&gems), 0);
        assert_eq!(ledger.deposit(&gems, 7), 7);
        assert_eq!(ledger.deposit(&gems, 3), 10);
    }

    #[test]
    fn withdraw_from_unknown_currency_records_zero() {
        let gems = Currency::new("gems");
        let mut ledger = Ledger::default();

        assert_eq!(ledger.withdraw(&gems, 5), 0);
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec![(&gems, 0)]);
    }
}
