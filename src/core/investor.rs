use serde::{Deserialize, Serialize};

/// An account taking part in the exchange.
///
/// The balance only moves through [`debit`](Investor::debit),
/// [`credit`](Investor::credit) and [`reset_to_zero`](Investor::reset_to_zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    id: String,
    balance: u64,
}

impl Investor {
    pub fn new(id: impl Into<String>, balance: u64) -> Investor {
        Investor {
            id: id.into(),
            balance,
        }
    }

    pub fn get_id(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_balance(&self) -> u64 {
        self.balance
    }

    /// Take `amount` out of the balance.
    ///
    /// # Panics
    /// When `amount` exceeds the balance. Callers derive amounts from the
    /// current balance, so an overdraft is a bug rather than a runtime condition.
    pub fn debit(&mut self, amount: u64) {
        assert!(
            amount <= self.balance,
            "invariant violation: debit of {amount} exceeds balance {} of {}",
            self.balance,
            self.id
        );
        self.balance -= amount;
    }

    /// Add `amount` to the balance.
    ///
    /// # Panics
    /// When the balance would overflow; value must never be lost silently.
    pub fn credit(&mut self, amount: u64) {
        self.balance = match self.balance.checked_add(amount) {
            Some(balance) => balance,
            None => panic!(
                "invariant violation: credit of {amount} overflows balance {} of {}",
                self.balance, self.id
            ),
        };
    }

    pub fn reset_to_zero(&mut self) {
        self.balance = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_credit() {
        let mut investor = Investor::new("alice", 100);
        investor.debit(30);
        assert_eq!(investor.get_balance(), 70);
        investor.credit(5);
        assert_eq!(investor.get_balance(), 75);
    }

    #[test]
    fn test_debit_entire_balance() {
        let mut investor = Investor::new("alice", 10);
        investor.debit(10);
        assert_eq!(investor.get_balance(), 0);
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn test_overdraft_fails_loudly() {
        let mut investor = Investor::new("alice", 10);
        investor.debit(11);
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn test_credit_overflow_fails_loudly() {
        let mut investor = Investor::new("alice", u64::MAX - 1);
        investor.credit(2);
    }

    #[test]
    fn test_credit_up_to_max() {
        let mut investor = Investor::new("alice", u64::MAX - 1);
        investor.credit(1);
        assert_eq!(investor.get_balance(), u64::MAX);
    }

    #[test]
    fn test_reset_to_zero() {
        let mut investor = Investor::new("alice", 10);
        investor.reset_to_zero();
        assert_eq!(investor.get_balance(), 0);
        assert_eq!(investor.get_id(), "alice");
    }
}
