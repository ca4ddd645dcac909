//! Workspace (policy) records and their distance-rate custom units.

use record_store::PendingAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Rates are stored in hundredths of the currency's minor unit.
pub const CUSTOM_UNIT_RATE_BASE_OFFSET: f64 = 100.0;
pub const DEFAULT_RATE_NAME: &str = "Default Rate";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const GENERIC_ERROR: &str = "common.genericErrorMessage";

/// `{ "<microsecond timestamp>": "<translation key>" }`
pub type Errors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    #[default]
    Personal,
    Free,
    Team,
    Corporate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyRole {
    Admin,
    Auditor,
    #[default]
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Mi,
    Km,
}

impl Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceUnit::Mi => write!(f, "mi"),
            DistanceUnit::Km => write!(f, "km"),
        }
    }
}

/// Optional workspace features gated behind the "more features" toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFeature {
    DistanceRates,
    Categories,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub role: PolicyRole,
    pub output_currency: String,
    pub are_categories_enabled: bool,
    pub are_distance_rates_enabled: bool,
    pub custom_units: BTreeMap<String, CustomUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
}

impl Policy {
    /// Deleted locally, waiting for the server to confirm.
    pub fn is_pending_delete(&self) -> bool {
        self.pending_action == Some(PendingAction::Delete)
    }

    pub fn is_admin(&self) -> bool {
        self.role == PolicyRole::Admin
    }

    /// Team and corporate workspaces are paid.
    pub fn is_paid_group(&self) -> bool {
        matches!(self.policy_type, PolicyType::Team | PolicyType::Corporate)
    }

    pub fn is_feature_enabled(&self, feature: PolicyFeature) -> bool {
        match feature {
            PolicyFeature::DistanceRates => self.are_distance_rates_enabled,
            PolicyFeature::Categories => self.are_categories_enabled,
        }
    }

    pub fn currency(&self) -> &str {
        if self.output_currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            &self.output_currency
        }
    }

    /// The distance custom unit: the first one the policy has.
    pub fn distance_unit(&self) -> Option<&CustomUnit> {
        self.custom_units.values().next()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitAttributes {
    pub unit: DistanceUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomUnit {
    #[serde(rename = "customUnitID")]
    pub custom_unit_id: String,
    pub name: String,
    pub attributes: UnitAttributes,
    pub rates: BTreeMap<String, Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pending_fields: BTreeMap<String, PendingAction>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub error_fields: BTreeMap<String, Errors>,
}

/// Fields of a custom unit that carry their own pending/error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomUnitField {
    Attributes,
    DefaultCategory,
}

impl CustomUnitField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomUnitField::Attributes => "attributes",
            CustomUnitField::DefaultCategory => "defaultCategory",
        }
    }
}

impl CustomUnit {
    pub fn pending(&self, field: CustomUnitField) -> Option<PendingAction> {
        self.pending_fields.get(field.as_str()).copied()
    }

    pub fn errors(&self, field: CustomUnitField) -> Option<&Errors> {
        self.error_fields
            .get(field.as_str())
            .filter(|errors| !errors.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rate {
    #[serde(rename = "customUnitRateID")]
    pub custom_unit_rate_id: String,
    pub name: String,
    /// Amount per unit times [`CUSTOM_UNIT_RATE_BASE_OFFSET`].
    pub rate: f64,
    pub currency: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Errors>,
}
