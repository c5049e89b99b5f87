//! Catalog and stock types consumed by the replenishment advisor.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub selling_price: Decimal,
    pub cost_price: Decimal,
    pub is_perishable: bool,
    pub shelf_life_days: u32,
}

/// A received batch of stock. Non-perishables carry no expiry date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryBatch {
    pub batch_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub expiry_date: Option<NaiveDate>,
    pub current_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Understock,
    Overstock,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Understock => "understock",
            Self::Overstock => "overstock",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "understock" => Some(Self::Understock),
            "overstock" => Some(Self::Overstock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertAction {
    Reorder,
    ReducePrice,
    Hold,
}

impl AlertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reorder => "reorder",
            Self::ReducePrice => "reduce-price",
            Self::Hold => "hold",
        }
    }
}

/// Review state of a stored alert. New alerts are pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    Pending,
    Executed,
    Ignored,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "executed" => Some(Self::Executed),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AlertDetails {
    Reorder {
        current_stock: u64,
        forecasted_demand: u64,
        recommended_qty: u64,
    },
    ReducePrice {
        current_stock: u64,
        forecasted_demand: u64,
        days_to_expiry: i64,
        new_price: Decimal,
        original_price: Decimal,
    },
    Hold {
        current_stock: u64,
        forecasted_demand: u64,
        days_to_expiry: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentAlert {
    pub id: Uuid,
    pub product_id: String,
    /// The day the alert applies to (the forecast target date).
    pub date: NaiveDate,
    pub kind: AlertKind,
    pub details: AlertDetails,
    #[serde(default)]
    pub status: AlertStatus,
}

impl ReplenishmentAlert {
    pub fn new(
        product_id: impl Into<String>,
        date: NaiveDate,
        kind: AlertKind,
        details: AlertDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            date,
            kind,
            details,
            status: AlertStatus::Pending,
        }
    }

    pub fn action(&self) -> AlertAction {
        match self.details {
            AlertDetails::Reorder { .. } => AlertAction::Reorder,
            AlertDetails::ReducePrice { .. } => AlertAction::ReducePrice,
            AlertDetails::Hold { .. } => AlertAction::Hold,
        }
    }
}
