//! Status enums for orders and payments.
//!
//! The order lifecycle is owned by the backend; clients only render it.
//! Unknown values deserialize into `Other` so a new backend status never
//! breaks cart or checkout code.

use serde::{Deserialize, Serialize};

/// Order status as reported by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment method accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Wire name of the payment method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "CREDIT_CARD",
            Self::Paypal => "PAYPAL",
            Self::CashOnDelivery => "CASH_ON_DELIVERY",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CREDIT_CARD" | "CARD" => Ok(Self::CreditCard),
            "PAYPAL" => Ok(Self::Paypal),
            "CASH_ON_DELIVERY" | "CASH" => Ok(Self::CashOnDelivery),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}
