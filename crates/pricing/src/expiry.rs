//! Quote expiry and aging classification.
//!
//! Private quotes stay usable for 180 calendar days, public price records for
//! 360. Age is the calendar-day difference between "today" and the quote
//! date; a quote is expired strictly after its window elapses (a 180-day-old
//! private quote is still usable, a 181-day-old one is not).

use chrono::NaiveDate;
use serde::Serialize;

use crate::quote::QuoteType;

/// Four-level aging bucket for a quote, from the research screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteAge {
    /// Past the validity window; must be replaced.
    Expired,
    /// 15 or fewer days of validity remaining.
    Warning,
    /// 30 or fewer days of validity remaining.
    Attention,
    Valid,
}

impl QuoteAge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Warning => "warning",
            Self::Attention => "attention",
            Self::Valid => "valid",
        }
    }
}

/// Calendar days elapsed since the quote date (negative for future dates).
pub fn age_in_days(quote_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - quote_date).num_days()
}

/// Boolean variant used by listings and the report.
pub fn is_expired(quote_date: NaiveDate, quote_type: QuoteType, today: NaiveDate) -> bool {
    age_in_days(quote_date, today) > quote_type.validity_days()
}

/// Four-level variant used by the research screen to flag stale quotes.
pub fn classify(quote_date: NaiveDate, quote_type: QuoteType, today: NaiveDate) -> QuoteAge {
    let remaining = quote_type.validity_days() - age_in_days(quote_date, today);
    if remaining < 0 {
        QuoteAge::Expired
    } else if remaining <= 15 {
        QuoteAge::Warning
    } else if remaining <= 30 {
        QuoteAge::Attention
    } else {
        QuoteAge::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    #[test]
    fn private_quote_expires_after_180_days() {
        assert!(!is_expired(days_ago(180), QuoteType::Private, today()));
        assert!(is_expired(days_ago(181), QuoteType::Private, today()));
    }

    #[test]
    fn public_quote_expires_after_360_days() {
        assert!(!is_expired(days_ago(360), QuoteType::Public, today()));
        assert!(is_expired(days_ago(361), QuoteType::Public, today()));
    }

    #[test]
    fn fresh_quote_is_valid() {
        assert_eq!(classify(days_ago(0), QuoteType::Private, today()), QuoteAge::Valid);
        assert_eq!(classify(days_ago(100), QuoteType::Private, today()), QuoteAge::Valid);
    }

    #[test]
    fn attention_bucket_covers_30_days_remaining() {
        // 180 - 150 = 30 days remaining.
        assert_eq!(classify(days_ago(150), QuoteType::Private, today()), QuoteAge::Attention);
        // 31 days remaining stays valid.
        assert_eq!(classify(days_ago(149), QuoteType::Private, today()), QuoteAge::Valid);
    }

    #[test]
    fn warning_bucket_covers_15_days_remaining() {
        assert_eq!(classify(days_ago(165), QuoteType::Private, today()), QuoteAge::Warning);
        assert_eq!(classify(days_ago(166), QuoteType::Private, today()), QuoteAge::Warning);
        assert_eq!(classify(days_ago(164), QuoteType::Private, today()), QuoteAge::Attention);
    }

    #[test]
    fn boundary_day_is_warning_not_expired() {
        // Exactly at the window: 0 days remaining, usable for one more day.
        assert_eq!(classify(days_ago(180), QuoteType::Private, today()), QuoteAge::Warning);
        assert_eq!(classify(days_ago(181), QuoteType::Private, today()), QuoteAge::Expired);
    }

    #[test]
    fn future_dated_quote_is_valid() {
        assert_eq!(classify(days_ago(-5), QuoteType::Private, today()), QuoteAge::Valid);
        assert!(!is_expired(days_ago(-5), QuoteType::Private, today()));
    }
}
