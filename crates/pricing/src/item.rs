use serde::{Deserialize, Serialize};

use pricelab_core::{DomainError, DomainResult, ItemId, ProcessId};

/// Which estimator the report uses as the item's unit price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingStrategy {
    /// Mean of quotes within one sigma of the raw mean (the default).
    #[default]
    Sanitized,
    Mean,
    Median,
}

impl PricingStrategy {
    /// Parse a lowercase label as sent by clients.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "sanitized" => Ok(Self::Sanitized),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            _ => Err(DomainError::validation(
                "pricing_strategy must be one of: sanitized, mean, median",
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sanitized => "sanitized",
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

/// A line item (good/service) within a process needing a price estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub process_id: ProcessId,
    /// Position within the process; drives ordering and the reorder endpoint.
    pub item_number: u32,
    pub specification: String,
    /// Unit of measure (e.g. "un", "cx", "kg").
    pub unit: String,
    /// Target quantity the estimate is multiplied by.
    pub quantity: f64,
    pub pricing_strategy: PricingStrategy,
}

impl Item {
    pub fn new(
        process_id: ProcessId,
        item_number: u32,
        specification: impl Into<String>,
        unit: impl Into<String>,
        quantity: f64,
        pricing_strategy: PricingStrategy,
    ) -> DomainResult<Self> {
        let specification = specification.into();
        let unit = unit.into();
        validate(item_number, &specification, quantity)?;

        Ok(Self {
            id: ItemId::new(),
            process_id,
            item_number,
            specification,
            unit,
            quantity,
            pricing_strategy,
        })
    }

    pub fn with_fields(
        mut self,
        item_number: u32,
        specification: impl Into<String>,
        unit: impl Into<String>,
        quantity: f64,
        pricing_strategy: PricingStrategy,
    ) -> DomainResult<Self> {
        let specification = specification.into();
        let unit = unit.into();
        validate(item_number, &specification, quantity)?;

        self.item_number = item_number;
        self.specification = specification;
        self.unit = unit;
        self.quantity = quantity;
        self.pricing_strategy = pricing_strategy;
        Ok(self)
    }
}

fn validate(item_number: u32, specification: &str, quantity: f64) -> DomainResult<()> {
    if item_number == 0 {
        return Err(DomainError::validation("item_number must be >= 1"));
    }
    if specification.trim().is_empty() {
        return Err(DomainError::validation("specification cannot be empty"));
    }
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(DomainError::validation("quantity must be a positive number"));
    }
    Ok(())
}
