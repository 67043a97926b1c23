use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Critical,
    Low,
    Info,
}

impl AlertStatus {
    /// Severity for a quantity that is already known to be under its reorder point.
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity == 0 {
            AlertStatus::Critical
        } else {
            AlertStatus::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Critical => "critical",
            AlertStatus::Low => "low",
            AlertStatus::Info => "info",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(AlertStatus::Critical),
            "low" => Ok(AlertStatus::Low),
            "info" => Ok(AlertStatus::Info),
            other => Err(format!(
                "unknown alert status '{}', expected one of: critical, low, info",
                other
            )),
        }
    }
}

/// What an alert is about: the product's total across all warehouses, or one
/// warehouse line. Stored as the optional `warehouseId` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum AlertScope {
    #[default]
    Aggregate,
    Warehouse(i64),
}

impl AlertScope {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, AlertScope::Aggregate)
    }

    pub fn warehouse_id(&self) -> Option<i64> {
        match self {
            AlertScope::Aggregate => None,
            AlertScope::Warehouse(id) => Some(*id),
        }
    }
}

impl From<Option<i64>> for AlertScope {
    fn from(value: Option<i64>) -> Self {
        value.map_or(AlertScope::Aggregate, AlertScope::Warehouse)
    }
}

impl From<AlertScope> for Option<i64> {
    fn from(scope: AlertScope) -> Self {
        scope.warehouse_id()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    /// Older files hold fractional ids; they load truncated
    #[serde(deserialize_with = "crate::common::deserialize_legacy_id")]
    pub id: i64,

    pub product_id: i64,

    #[serde(default)]
    pub product_name: String,

    /// Absent for aggregate alerts
    #[serde(
        rename = "warehouseId",
        default,
        skip_serializing_if = "AlertScope::is_aggregate"
    )]
    #[schema(value_type = Option<i64>)]
    pub scope: AlertScope,

    pub status: AlertStatus,

    pub message: String,

    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub resolved: bool,
}
