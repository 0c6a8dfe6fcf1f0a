//! # Invoice Numbering
//!
//! Pure transitions over [`NumberingConfig`].
//!
//! ## Issuance Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored config ─► maybe_reset ─► format_number ─► advance ─► store     │
//! │  {IMAGI, 44,      (new year?      "IMAGI260001"     {IMAGI, 2,          │
//! │   yearly}          → next = 1)                        yearly}           │
//! │                                                                         │
//! │  The whole sequence MUST run as one atomic step in storage; two        │
//! │  concurrent issuers that both read next = 7 would both print ...0007.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure. The zero-argument "today" forms read the
//! local clock; the `_at` forms take the date explicitly.

use chrono::{Datelike, Local, NaiveDate};

use crate::types::{NumberingConfig, ResetPolicy};
use crate::NUMBER_PAD_WIDTH;

/// Today's date on the local clock.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Restarts the counter when a yearly policy crosses a calendar year.
///
/// Returns the config unchanged when the policy is `Never`, when nothing
/// has been issued yet, or when `last_issued` is in the current year.
pub fn maybe_reset(config: &NumberingConfig, last_issued: Option<NaiveDate>) -> NumberingConfig {
    maybe_reset_at(config, last_issued, today())
}

/// [`maybe_reset`] against an explicit `today`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use imagicity_core::numbering::maybe_reset_at;
/// use imagicity_core::{NumberingConfig, ResetPolicy};
///
/// let config = NumberingConfig { prefix: "IMAGI".into(), next_number: 44, reset_policy: ResetPolicy::Yearly };
/// let today = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
/// let last = NaiveDate::from_ymd_opt(2025, 12, 30);
///
/// assert_eq!(maybe_reset_at(&config, last, today).next_number, 1);
/// ```
pub fn maybe_reset_at(
    config: &NumberingConfig,
    last_issued: Option<NaiveDate>,
    today: NaiveDate,
) -> NumberingConfig {
    match (config.reset_policy, last_issued) {
        (ResetPolicy::Yearly, Some(last)) if last.year() != today.year() => NumberingConfig {
            next_number: 1,
            ..config.clone()
        },
        _ => config.clone(),
    }
}

/// Renders the number the next invoice would receive. Does not advance.
pub fn format_number(config: &NumberingConfig) -> String {
    format_number_at(config, today())
}

/// [`format_number`] against an explicit `today`.
///
/// `prefix + two-digit year + counter zero-padded to 4`. Counters above
/// 9999 print in full.
///
/// ```rust
/// use chrono::NaiveDate;
/// use imagicity_core::numbering::format_number_at;
/// use imagicity_core::NumberingConfig;
///
/// let config = NumberingConfig { next_number: 12, ..Default::default() };
/// let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
/// assert_eq!(format_number_at(&config, today), "IMAGI260012");
/// ```
pub fn format_number_at(config: &NumberingConfig, today: NaiveDate) -> String {
    format!(
        "{}{}{:0width$}",
        config.prefix,
        today.format("%y"),
        config.next_number,
        width = NUMBER_PAD_WIDTH
    )
}

/// Moves the counter forward by one.
pub fn advance(config: &NumberingConfig) -> NumberingConfig {
    NumberingConfig {
        next_number: config.next_number.saturating_add(1),
        ..config.clone()
    }
}

/// A freshly issued number and the config to persist afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedNumber {
    pub number: String,
    pub next: NumberingConfig,
}

/// Runs reset → format → advance against the local clock.
pub fn issue_number(config: &NumberingConfig, last_issued: Option<NaiveDate>) -> IssuedNumber {
    issue_number_at(config, last_issued, today())
}

/// Runs reset → format → advance against an explicit `today`.
pub fn issue_number_at(
    config: &NumberingConfig,
    last_issued: Option<NaiveDate>,
    today: NaiveDate,
) -> IssuedNumber {
    let current = maybe_reset_at(config, last_issued, today);
    IssuedNumber {
        number: format_number_at(&current, today),
        next: advance(&current),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn config(next_number: u32, reset_policy: ResetPolicy) -> NumberingConfig {
        NumberingConfig {
            prefix: "IMAGI".to_string(),
            next_number,
            reset_policy,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_number_shape() {
        let number = format_number(&config(12, ResetPolicy::Yearly));

        assert_eq!(number.len(), "IMAGI".len() + 2 + 4);
        assert!(number.starts_with("IMAGI"));
        assert!(number[5..7].chars().all(|c| c.is_ascii_digit()));
        assert!(number.ends_with("0012"));
    }

    #[test]
    fn test_format_number_at() {
        assert_eq!(
            format_number_at(&config(12, ResetPolicy::Yearly), date(2026, 10, 17)),
            "IMAGI260012"
        );
        assert_eq!(
            format_number_at(&config(12345, ResetPolicy::Never), date(2031, 1, 1)),
            "IMAGI3112345"
        );
    }

    #[test]
    fn test_format_number_is_a_peek() {
        let cfg = config(7, ResetPolicy::Yearly);
        let today = date(2026, 5, 1);

        assert_eq!(format_number_at(&cfg, today), format_number_at(&cfg, today));
        assert_eq!(cfg.next_number, 7);
    }

    #[test]
    fn test_advance() {
        assert_eq!(advance(&config(1, ResetPolicy::Yearly)).next_number, 2);
        assert_eq!(advance(&config(u32::MAX, ResetPolicy::Never)).next_number, u32::MAX);
    }

    #[test]
    fn test_maybe_reset_previous_year() {
        let last_year = today().checked_sub_months(Months::new(12)).unwrap();
        let reset = maybe_reset(&config(44, ResetPolicy::Yearly), Some(last_year));
        assert_eq!(reset.next_number, 1);
        assert_eq!(reset.prefix, "IMAGI");
    }

    #[test]
    fn test_maybe_reset_same_year_keeps_counter() {
        let reset = maybe_reset_at(
            &config(44, ResetPolicy::Yearly),
            Some(date(2026, 1, 1)),
            date(2026, 12, 31),
        );
        assert_eq!(reset.next_number, 44);
    }

    #[test]
    fn test_maybe_reset_without_history() {
        let reset = maybe_reset_at(&config(44, ResetPolicy::Yearly), None, date(2026, 1, 1));
        assert_eq!(reset.next_number, 44);
    }

    #[test]
    fn test_never_policy_never_resets() {
        for last in [date(1999, 6, 1), date(2025, 12, 31), date(2030, 1, 1)] {
            let reset = maybe_reset_at(&config(44, ResetPolicy::Never), Some(last), date(2026, 1, 1));
            assert_eq!(reset.next_number, 44);
        }
    }

    #[test]
    fn test_issue_number_sequence() {
        let today = date(2026, 1, 3);
        let issued = issue_number_at(&config(44, ResetPolicy::Yearly), Some(date(2025, 12, 29)), today);

        assert_eq!(issued.number, "IMAGI260001");
        assert_eq!(issued.next.next_number, 2);

        let second = issue_number_at(&issued.next, Some(today), today);
        assert_eq!(second.number, "IMAGI260002");
        assert_eq!(second.next.next_number, 3);
    }
}
