use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use lpg_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::is_valid_luhn;

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// A digit string that passes the Luhn check. Used for both order numbers and withdrawal reference numbers.
///
/// The only ways to build one are [`OrderNumber::from_str`], which validates, and decoding a row that was validated
/// on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("'{0}' is not a string of digits")]
    Malformed(String),
    #[error("'{0}' does not pass the Luhn checksum")]
    ChecksumFailed(String),
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(OrderNumberError::Malformed(s.to_string()));
        }
        if !is_valid_luhn(s) {
            return Err(OrderNumberError::ChecksumFailed(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been submitted, but the accrual resolver has not started working on it.
    New,
    /// The accrual resolver is calculating the reward for this order.
    Processing,
    /// The accrual resolver refused the order. No reward will be paid. Terminal.
    Invalid,
    /// The reward has been calculated and credited to the owner's balance. Terminal.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// Whether the order lifecycle permits moving from `self` to `next`. Staying in the same state is not a
    /// transition.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (New, Processing) | (New, Invalid) | (New, Processed) | (Processing, Invalid) |
            (Processing, Processed))
    }

    /// All the states from which `target` can be reached.
    pub fn predecessors(target: OrderStatusType) -> Vec<OrderStatusType> {
        use OrderStatusType::*;
        [New, Processing, Invalid, Processed].into_iter().filter(|s| s.can_transition_to(target)).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::New => "NEW",
            OrderStatusType::Processing => "PROCESSING",
            OrderStatusType::Invalid => "INVALID",
            OrderStatusType::Processed => "PROCESSED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Only ever set when `status` is `Processed`
    pub accrual: Option<Amount>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64, uploaded_at: DateTime<Utc>) -> Self {
        Self { number, user_id, uploaded_at }
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub current_balance: Amount,
    pub total_withdrawn: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The credentials half of a user record. Kept apart from [`UserAccount`] so that a password hash can never be
/// serialized by accident.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub reference: OrderNumber,
    pub amount: Amount,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub reference: OrderNumber,
    pub amount: Amount,
    pub processed_at: DateTime<Utc>,
}

//--------------------------------------    AccrualStatus      ---------------------------------------------------------
/// The order status as reported by the external accrual resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    /// Known to the resolver (or not known yet) but not being worked on.
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccrualStatus::Registered => f.write_str("REGISTERED"),
            AccrualStatus::Processing => f.write_str("PROCESSING"),
            AccrualStatus::Invalid => f.write_str("INVALID"),
            AccrualStatus::Processed => f.write_str("PROCESSED"),
        }
    }
}

/// The resolver's answer for a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualReport {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Amount>,
}

impl AccrualReport {
    pub fn registered(order: &OrderNumber) -> Self {
        Self { order: order.to_string(), status: AccrualStatus::Registered, accrual: None }
    }

    pub fn processing(order: &OrderNumber) -> Self {
        Self { order: order.to_string(), status: AccrualStatus::Processing, accrual: None }
    }

    pub fn invalid(order: &OrderNumber) -> Self {
        Self { order: order.to_string(), status: AccrualStatus::Invalid, accrual: None }
    }

    pub fn processed(order: &OrderNumber, accrual: Amount) -> Self {
        Self { order: order.to_string(), status: AccrualStatus::Processed, accrual: Some(accrual) }
    }
}
