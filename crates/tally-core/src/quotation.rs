//! # Quotation Numbers
//!
//! Quotation numbers look like `YYYYMMDD-NNN`: the issue date followed by a
//! three-digit sequence that restarts at `000` every new day.
//!
//! ## Sequencing Rules
//! ```text
//! last issued        today         next
//! ───────────────    ──────────    ───────────────
//! 20241212-004       2024-12-12    20241212-005     same day: suffix + 1
//! 20241212-004       2024-12-13    20241213-000     new day: restart
//! 20241212-004       2024-12-11    20241212-005     clock behind: keep date
//! 20241212-999       2024-12-12    error            suffix exhausted
//! ```
//!
//! `Ord` on [`QuotationNumber`] agrees with the string ordering, so "strictly
//! greater" means the same thing for the struct and its rendering.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::MAX_QUOTATION_SEQUENCE;

/// A parsed quotation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuotationNumber {
    date: NaiveDate,
    sequence: u16,
}

impl QuotationNumber {
    /// Creates a quotation number, rejecting suffixes that don't fit `NNN`.
    pub fn new(date: NaiveDate, sequence: u16) -> CoreResult<Self> {
        if sequence > MAX_QUOTATION_SEQUENCE {
            return Err(CoreError::InvalidQuotationNumber(format!(
                "{}-{}",
                date.format("%Y%m%d"),
                sequence
            )));
        }
        Ok(QuotationNumber { date, sequence })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Computes the number to issue after `self`, given today's date.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tally_core::QuotationNumber;
    ///
    /// let last: QuotationNumber = "20241212-004".parse().unwrap();
    /// let today = NaiveDate::from_ymd_opt(2024, 12, 13).unwrap();
    /// assert_eq!(last.next_for(today).unwrap().to_string(), "20241213-000");
    /// ```
    pub fn next_for(&self, today: NaiveDate) -> CoreResult<QuotationNumber> {
        if today > self.date {
            return Ok(QuotationNumber {
                date: today,
                sequence: 0,
            });
        }

        if self.sequence >= MAX_QUOTATION_SEQUENCE {
            return Err(CoreError::QuotationSequenceExhausted {
                date: self.date.format("%Y%m%d").to_string(),
            });
        }

        Ok(QuotationNumber {
            date: self.date,
            sequence: self.sequence + 1,
        })
    }
}

impl fmt::Display for QuotationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.date.format("%Y%m%d"), self.sequence)
    }
}

impl FromStr for QuotationNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidQuotationNumber(s.to_string());

        let (date_part, seq_part) = s.trim().split_once('-').ok_or_else(invalid)?;
        if date_part.len() != 8 || seq_part.len() != 3 {
            return Err(invalid());
        }
        if !seq_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|_| invalid())?;
        let sequence: u16 = seq_part.parse().map_err(|_| invalid())?;

        QuotationNumber::new(date, sequence)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INITIAL_QUOTATION_NUMBER;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let number: QuotationNumber = INITIAL_QUOTATION_NUMBER.parse().unwrap();
        assert_eq!(number.date(), day(2024, 12, 12));
        assert_eq!(number.sequence(), 0);
        assert_eq!(number.to_string(), INITIAL_QUOTATION_NUMBER);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "20241212", "20241212-00", "20241312-000", "2024121-0001", "20241212-0a1"] {
            assert!(bad.parse::<QuotationNumber>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_same_day_increments() {
        let last: QuotationNumber = "20241212-004".parse().unwrap();
        let next = last.next_for(day(2024, 12, 12)).unwrap();
        assert_eq!(next.to_string(), "20241212-005");
    }

    #[test]
    fn test_new_day_restarts() {
        let last: QuotationNumber = "20241212-004".parse().unwrap();
        let next = last.next_for(day(2025, 1, 2)).unwrap();
        assert_eq!(next.to_string(), "20250102-000");
    }

    #[test]
    fn test_clock_behind_keeps_stored_date() {
        let last: QuotationNumber = "20241212-004".parse().unwrap();
        let next = last.next_for(day(2024, 12, 1)).unwrap();
        assert_eq!(next.to_string(), "20241212-005");
    }

    #[test]
    fn test_exhausted_suffix() {
        let last: QuotationNumber = "20241212-999".parse().unwrap();
        assert!(matches!(
            last.next_for(day(2024, 12, 12)),
            Err(CoreError::QuotationSequenceExhausted { .. })
        ));
        // a new day still works
        assert!(last.next_for(day(2024, 12, 13)).is_ok());
    }

    proptest! {
        #[test]
        fn prop_issued_numbers_strictly_increase(
            offsets in proptest::collection::vec(-3i64..3, 1..200)
        ) {
            let mut last: QuotationNumber = INITIAL_QUOTATION_NUMBER.parse().unwrap();
            let mut today = last.date();

            for offset in offsets {
                today = today + chrono::Duration::days(offset);
                match last.next_for(today) {
                    Ok(next) => {
                        prop_assert!(next > last);
                        prop_assert!(next.to_string() > last.to_string());
                        last = next;
                    }
                    Err(CoreError::QuotationSequenceExhausted { .. }) => {}
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }
        }
    }
}
