//! Contract terms of a sales mandate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Validity window applied when the mandate carries no exclusivity period.
pub const DEFAULT_VALIDITY_DAYS: u32 = 90;

/// Commercial terms of the mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    /// Exclusivity period in days. `0` means non-exclusive.
    pub exclusivity_days: u32,
    /// Brokerage commission as a percentage of the sale price.
    pub commission_percent: Decimal,
}

impl Terms {
    /// Validate the commission range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.commission_percent <= Decimal::ZERO
            || self.commission_percent > Decimal::from(100)
        {
            return Err(ValidationError::CommissionOutOfRange {
                given: self.commission_percent.to_string(),
            });
        }
        Ok(())
    }

    /// Days the mandate (and its signing deadline) remains valid: the
    /// exclusivity period, or [`DEFAULT_VALIDITY_DAYS`] when non-exclusive.
    pub fn validity_days(&self) -> u32 {
        if self.exclusivity_days > 0 {
            self.exclusivity_days
        } else {
            DEFAULT_VALIDITY_DAYS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_uses_exclusivity_when_set() {
        let terms = Terms {
            exclusivity_days: 45,
            commission_percent: Decimal::from(6),
        };
        assert_eq!(terms.validity_days(), 45);
    }

    #[test]
    fn validity_defaults_when_non_exclusive() {
        let terms = Terms {
            exclusivity_days: 0,
            commission_percent: Decimal::from(6),
        };
        assert_eq!(terms.validity_days(), DEFAULT_VALIDITY_DAYS);
    }

    #[test]
    fn zero_commission_rejected() {
        let terms = Terms {
            exclusivity_days: 0,
            commission_percent: Decimal::ZERO,
        };
        assert!(terms.validate().is_err());
    }

    #[test]
    fn commission_over_hundred_rejected() {
        let terms = Terms {
            exclusivity_days: 0,
            commission_percent: Decimal::from(120),
        };
        assert!(matches!(
            terms.validate(),
            Err(ValidationError::CommissionOutOfRange { .. })
        ));
    }

    #[test]
    fn fractional_commission_accepted() {
        let terms = Terms {
            exclusivity_days: 30,
            // 5.5%
            commission_percent: Decimal::new(55, 1),
        };
        assert!(terms.validate().is_ok());
    }
}
