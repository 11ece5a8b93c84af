//! Rings: a pair of matched orders and the fills the matching engine
//! assigned to them

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use constants::AMOUNT_BITS;

use crate::{errors::SettlementError, order::Order};

/// A two-sided match: order A sells what order B buys and vice versa, with a
/// fee leg per order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ring {
    /// The first matched order
    pub order_a: Order,
    /// The second matched order
    pub order_b: Order,
    /// The amount of its sell token order A gives up
    #[serde(with = "crate::ser_amount")]
    pub fill_s_a: u128,
    /// The amount of its buy token order A is quoted
    #[serde(with = "crate::ser_amount")]
    pub fill_b_a: u128,
    /// The fee order A pays
    #[serde(with = "crate::ser_amount")]
    pub fill_f_a: u128,
    /// The amount of its sell token order B gives up
    #[serde(with = "crate::ser_amount")]
    pub fill_s_b: u128,
    /// The amount of its buy token order B is quoted
    #[serde(with = "crate::ser_amount")]
    pub fill_b_b: u128,
    /// The fee order B pays
    #[serde(with = "crate::ser_amount")]
    pub fill_f_b: u128,
}

impl Ring {
    /// Validate everything about the ring that does not depend on tree
    /// state: ranges, signatures, token symmetry, rates and feasibility
    pub fn validate(&self) -> Result<(), SettlementError> {
        for (side, order) in [("A", &self.order_a), ("B", &self.order_b)] {
            if !order.check_ranges() {
                return Err(SettlementError::RangeViolation(format!(
                    "order {side} field out of range"
                )));
            }
            if !order.verify_signature() {
                return Err(SettlementError::SignatureInvalid(format!(
                    "order {side} signature does not verify"
                )));
            }
        }

        for (name, fill) in self.fills() {
            if fill >= 1 << AMOUNT_BITS {
                return Err(SettlementError::RangeViolation(format!(
                    "fill {name} exceeds {AMOUNT_BITS} bits"
                )));
            }
        }

        if self.order_a.token_s != self.order_b.token_b
            || self.order_a.token_b != self.order_b.token_s
        {
            return Err(SettlementError::MatchInfeasible(
                "orders do not trade opposite token pairs".to_string(),
            ));
        }

        self.check_rate(
            "A",
            self.fill_s_a,
            self.fill_b_a,
            self.order_a.amount_s,
            self.order_a.amount_b,
        )?;
        self.check_rate(
            "B",
            self.fill_s_b,
            self.fill_b_b,
            self.order_b.amount_s,
            self.order_b.amount_b,
        )?;
        self.check_rate(
            "fee A",
            self.fill_f_a,
            self.fill_s_a,
            self.order_a.amount_f,
            self.order_a.amount_s,
        )?;
        self.check_rate(
            "fee B",
            self.fill_f_b,
            self.fill_s_b,
            self.order_b.amount_f,
            self.order_b.amount_s,
        )?;

        if self.fill_b_b > self.fill_s_a {
            return Err(SettlementError::MatchInfeasible(
                "order B receives more than order A sells".to_string(),
            ));
        }
        if self.fill_b_a > self.fill_s_b {
            return Err(SettlementError::MatchInfeasible(
                "order A receives more than order B sells".to_string(),
            ));
        }

        Ok(())
    }

    /// The six fills with their names, for diagnostics
    fn fills(&self) -> [(&'static str, u128); 6] {
        [
            ("fillS_A", self.fill_s_a),
            ("fillB_A", self.fill_b_a),
            ("fillF_A", self.fill_f_a),
            ("fillS_B", self.fill_s_b),
            ("fillB_B", self.fill_b_b),
            ("fillF_B", self.fill_f_b),
        ]
    }

    /// Check the cross-product rate invariant
    /// `amount_s · fill_b = amount_b · fill_s`
    fn check_rate(
        &self,
        name: &str,
        fill_s: u128,
        fill_b: u128,
        amount_s: u128,
        amount_b: u128,
    ) -> Result<(), SettlementError> {
        let lhs = BigUint::from(amount_s) * BigUint::from(fill_b);
        let rhs = BigUint::from(amount_b) * BigUint::from(fill_s);
        if lhs != rhs {
            return Err(SettlementError::RateMismatch(format!(
                "rate {name}: {amount_s}·{fill_b} != {amount_b}·{fill_s}"
            )));
        }

        Ok(())
    }
}
