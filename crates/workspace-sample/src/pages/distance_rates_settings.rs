//! # Distance Rates Settings
//!
//! Unit and default-category pickers of the distance custom unit. Both rows show the
//! pending marker while a change is in flight and the field's errors after a failure;
//! dismissing the errors is a local store write.

use super::{check_access, load_policy, AccessDenied, AccessGuard, PageContext, PageError, Screen};
use crate::actions::{
    clear_policy_distance_rates_error_fields, set_policy_distance_rates_default_category,
    set_policy_distance_rates_unit,
};
use crate::model::{CustomUnit, CustomUnitField, DistanceUnit, Policy, PolicyFeature, POLICY};
use record_store::{Consumer, KeyResolver, LiveValue, RouteParams};
use tracing::info;

const GUARDS: [AccessGuard; 3] = [
    AccessGuard::Admin,
    AccessGuard::PaidPolicy,
    AccessGuard::FeatureEnabled(PolicyFeature::DistanceRates),
];

/// One picker row.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorRow<T> {
    pub label: String,
    pub value: T,
    pub pending: bool,
    /// Translated, oldest first.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView {
    pub title: String,
    pub unit: SelectorRow<DistanceUnit>,
    /// Only shown when categories are enabled.
    pub default_category: Option<SelectorRow<Option<String>>>,
}

pub struct DistanceRatesSettingsPage {
    ctx: PageContext,
    consumer: Consumer,
    policy: LiveValue,
}

impl DistanceRatesSettingsPage {
    pub fn mount(ctx: PageContext, params: RouteParams) -> Self {
        let mut consumer = Consumer::mount(&ctx.store, "DistanceRatesSettingsPage", params);
        let policy = consumer.bind(KeyResolver::from_param("policyID", POLICY));
        Self {
            ctx,
            consumer,
            policy,
        }
    }

    pub fn render(&self) -> Screen<SettingsView> {
        let Ok((policy, unit)) = self.guarded() else {
            return self.ctx.not_found();
        };
        let default_category = policy.is_feature_enabled(PolicyFeature::Categories).then(|| {
            self.row(
                &unit,
                CustomUnitField::DefaultCategory,
                "workspace.distanceRates.defaultCategory",
                unit.default_category.clone(),
            )
        });
        Screen::Content(SettingsView {
            title: self.ctx.translate("workspace.common.settings"),
            unit: self.row(
                &unit,
                CustomUnitField::Attributes,
                "workspace.distanceRates.unit",
                unit.attributes.unit,
            ),
            default_category,
        })
    }

    pub async fn set_unit(&self, unit: DistanceUnit) -> Result<(), PageError> {
        let (policy, current) = self.guarded()?;
        if current.attributes.unit == unit {
            return Ok(());
        }
        let mut updated = current.clone();
        updated.attributes.unit = unit;
        info!(policy_id = %policy.id, %unit, "Changing distance unit");
        set_policy_distance_rates_unit(
            &self.ctx.store,
            self.ctx.remote.as_ref(),
            &policy.id,
            &current,
            &updated,
        )
        .await?;
        Ok(())
    }

    pub async fn set_default_category(&self, category: &str) -> Result<(), PageError> {
        let (policy, current) = self.guarded()?;
        if current.default_category.as_deref() == Some(category) {
            return Ok(());
        }
        let mut updated = current.clone();
        updated.default_category = Some(category.to_string());
        info!(policy_id = %policy.id, %category, "Changing default category");
        set_policy_distance_rates_default_category(
            &self.ctx.store,
            self.ctx.remote.as_ref(),
            &policy.id,
            &current,
            &updated,
        )
        .await?;
        Ok(())
    }

    /// Dismisses the errors shown under `field`.
    pub fn clear_errors(&self, field: CustomUnitField) -> Result<(), PageError> {
        let (policy, unit) = self.guarded()?;
        clear_policy_distance_rates_error_fields(
            &self.ctx.store,
            &policy.id,
            &unit.custom_unit_id,
            &[field],
        )?;
        Ok(())
    }

    pub fn set_params(&mut self, params: RouteParams) {
        self.consumer.set_params(params);
    }

    pub fn close(self) {
        self.consumer.unmount();
    }

    fn guarded(&self) -> Result<(Policy, CustomUnit), AccessDenied> {
        let policy = load_policy(&self.policy);
        let policy = check_access(policy.as_ref(), &GUARDS)?;
        let unit = policy
            .distance_unit()
            .cloned()
            .ok_or(AccessDenied::MissingCustomUnit)?;
        Ok((policy.clone(), unit))
    }

    fn row<T>(
        &self,
        unit: &CustomUnit,
        field: CustomUnitField,
        label: &str,
        value: T,
    ) -> SelectorRow<T> {
        SelectorRow {
            label: self.ctx.translate(label),
            value,
            pending: unit.pending(field).is_some(),
            errors: unit
                .errors(field)
                .map(|errors| errors.values().map(|key| self.ctx.translate(key)).collect())
                .unwrap_or_default(),
        }
    }
}
