use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pricelab_core::{DomainError, DomainResult, ItemId, QuoteId};

/// Where a quote came from; drives the validity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteType {
    /// Public price record (official panels, published contracts).
    Public,
    /// Direct supplier quotation.
    #[default]
    Private,
}

impl QuoteType {
    /// How many calendar days a quote of this type stays usable.
    pub fn validity_days(&self) -> i64 {
        match self {
            Self::Public => 360,
            Self::Private => 180,
        }
    }

    /// Parse a label as sent by clients or pasted imports (pt labels too).
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" | "publico" | "público" | "publica" | "pública" => Ok(Self::Public),
            "private" | "privado" | "privada" | "" => Ok(Self::Private),
            _ => Err(DomainError::validation(
                "quote_type must be one of: public, private",
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// One supplier's unit price for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub item_id: ItemId,
    /// Supplier name or public price panel reference.
    pub source: String,
    pub quote_date: NaiveDate,
    pub unit_price: f64,
    pub quote_type: QuoteType,
    /// Legacy manual flag; persisted but not consulted by the statistics.
    pub is_outlier: bool,
}

impl Quote {
    pub fn new(
        item_id: ItemId,
        source: impl Into<String>,
        quote_date: NaiveDate,
        unit_price: f64,
        quote_type: QuoteType,
    ) -> DomainResult<Self> {
        let source = source.into();
        validate(&source, unit_price)?;

        Ok(Self {
            id: QuoteId::new(),
            item_id,
            source,
            quote_date,
            unit_price,
            quote_type,
            is_outlier: false,
        })
    }

    pub fn with_fields(
        mut self,
        source: impl Into<String>,
        quote_date: NaiveDate,
        unit_price: f64,
        quote_type: QuoteType,
        is_outlier: bool,
    ) -> DomainResult<Self> {
        let source = source.into();
        validate(&source, unit_price)?;

        self.source = source;
        self.quote_date = quote_date;
        self.unit_price = unit_price;
        self.quote_type = quote_type;
        self.is_outlier = is_outlier;
        Ok(self)
    }
}

fn validate(source: &str, unit_price: f64) -> DomainResult<()> {
    if source.trim().is_empty() {
        return Err(DomainError::validation("source cannot be empty"));
    }
    if !(unit_price.is_finite() && unit_price > 0.0) {
        return Err(DomainError::validation("unit_price must be a positive number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn validity_windows_per_type() {
        assert_eq!(QuoteType::Private.validity_days(), 180);
        assert_eq!(QuoteType::Public.validity_days(), 360);
    }

    #[test]
    fn quote_type_parse_accepts_pt_labels_and_defaults_private() {
        assert_eq!(QuoteType::parse("Publico").unwrap(), QuoteType::Public);
        assert_eq!(QuoteType::parse("privada").unwrap(), QuoteType::Private);
        assert_eq!(QuoteType::parse("").unwrap(), QuoteType::Private);
        assert!(QuoteType::parse("semi-public").is_err());
    }

    #[test]
    fn new_quote_rejects_non_positive_price() {
        let err = Quote::new(
            ItemId::new(),
            "Fornecedor A",
            date(2024, 3, 12),
            0.0,
            QuoteType::Private,
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("unit_price")),
            _ => panic!("expected Validation error"),
        }
    }
}
