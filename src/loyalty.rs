//! Loyalty-points ledger.
//!
//! One point is worth one currency unit when redeemed. Points are earned on what the
//! customer actually pays, after redemption: one point per `points_per` whole units.

use std::collections::HashMap;

use tracing::info;

use crate::Amount;
use crate::model::{LoyaltyAccount, Phone};

/// Loyalty accounts in file order, indexed by phone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    accounts: Vec<LoyaltyAccount>,
    index: HashMap<Phone, usize>,
}

/// Outcome of settling one bill against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    /// Points spent; equal to the currency amount taken off the bill.
    pub redeemed: u64,
    pub earned: u64,
    /// Balance after redemption and accrual.
    pub balance: u64,
}

impl Settlement {
    pub fn redeemed_amount(&self) -> Amount {
        Amount::from_units(self.redeemed as i64)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account. Returns `false` (leaving the ledger untouched) if the phone is taken.
    pub fn insert(&mut self, account: LoyaltyAccount) -> bool {
        if self.index.contains_key(&account.phone) {
            return false;
        }
        self.index.insert(account.phone.clone(), self.accounts.len());
        self.accounts.push(account);
        true
    }

    pub fn get(&self, phone: &Phone) -> Option<&LoyaltyAccount> {
        self.index.get(phone).map(|&i| &self.accounts[i])
    }

    pub fn accounts(&self) -> impl Iterator<Item = &LoyaltyAccount> + '_ {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Points balance, zero for unknown phones.
    pub fn balance(&self, phone: &Phone) -> u64 {
        self.get(phone).map_or(0, |account| account.points)
    }

    /// Ensure an account exists for `phone`. An existing account keeps its name.
    pub fn open_account(mut self, phone: Phone, name: &str) -> Ledger {
        if self.get(&phone).is_none() {
            info!(phone = %phone, name, "opening loyalty account");
            self.insert(LoyaltyAccount::new(phone, name));
        }
        self
    }

    /// Points that could be redeemed against `total`: `min(balance, total)`,
    /// in whole units so the bill never goes below zero.
    pub fn redeemable(&self, phone: &Phone, total: Amount) -> u64 {
        let cap = u64::try_from(total.whole_units()).unwrap_or(0);
        self.balance(phone).min(cap)
    }

    /// Apply an optional redemption and then accrue points on the remaining total.
    ///
    /// An unknown phone is settled against a fresh, unnamed account.
    pub fn settle(
        self,
        phone: &Phone,
        redeem: bool,
        total: Amount,
        points_per: u32,
    ) -> (Ledger, Settlement) {
        let mut ledger = self.open_account(phone.clone(), "");

        let redeemed = if redeem {
            ledger.redeemable(phone, total)
        } else {
            0
        };
        let payable = total - Amount::from_units(redeemed as i64);
        let earned = accrued_points(payable, points_per);

        let mut settlement = Settlement {
            redeemed,
            earned,
            balance: 0,
        };
        if let Some(&i) = ledger.index.get(phone) {
            let account = &mut ledger.accounts[i];
            account.points = account.points - redeemed + earned;
            settlement.balance = account.points;
        }

        info!(
            phone = %phone,
            redeemed,
            earned,
            balance = settlement.balance,
            "loyalty settled"
        );
        (ledger, settlement)
    }
}

/// Points earned for paying `amount`: `floor(amount / points_per)`, never negative.
pub fn accrued_points(amount: Amount, points_per: u32) -> u64 {
    if points_per == 0 {
        return 0;
    }
    u64::try_from(amount.whole_units()).map_or(0, |units| units / u64::from(points_per))
}

impl FromIterator<LoyaltyAccount> for Ledger {
    fn from_iter<I: IntoIterator<Item = LoyaltyAccount>>(iter: I) -> Self {
        let mut ledger = Ledger::new();
        for account in iter {
            ledger.insert(account);
        }
        ledger
    }
}
