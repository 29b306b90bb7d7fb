//! # Fee Allocation
//!
//! Attached value pays first, the pool subsidy covers the rest.

use crate::domain::{Amount, GatewayError};

/// How one dispatch is paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FundingSplit {
    /// Taken from value attached to the call (or session fuel).
    pub from_attached: Amount,
    /// Taken from the pool subsidy.
    pub from_subsidy: Amount,
}

impl FundingSplit {
    /// Total charged.
    pub fn total(&self) -> Amount {
        self.from_attached + self.from_subsidy
    }

    /// Give back `amount` of the charge, subsidy first.
    ///
    /// Returns the portion handed back to each source.
    pub fn release(&mut self, amount: Amount) -> FundingSplit {
        let amount = amount.min(self.total());
        let to_subsidy = amount.min(self.from_subsidy);
        let to_attached = amount - to_subsidy;
        self.from_subsidy -= to_subsidy;
        self.from_attached -= to_attached;
        FundingSplit {
            from_attached: to_attached,
            from_subsidy: to_subsidy,
        }
    }
}

/// Split `cost` between attached value and subsidy.
///
/// Fails without consuming anything when both together fall short.
pub fn allocate_funding(
    cost: Amount,
    attached: Amount,
    subsidy: Amount,
) -> Result<FundingSplit, GatewayError> {
    let from_attached = cost.min(attached);
    let from_subsidy = cost - from_attached;
    if from_subsidy > subsidy {
        return Err(GatewayError::InsufficientFunding {
            required: cost,
            available: attached.saturating_add(subsidy),
        });
    }
    Ok(FundingSplit {
        from_attached,
        from_subsidy,
    })
}
