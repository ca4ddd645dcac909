//! # Workspace Sample
//!
//! Walks one admin through the distance-rate screens:
//! 1. Seeds a workspace into the [`RecordStore`](record_store::RecordStore).
//! 2. Creates a rate through the create-rate form.
//! 3. Switches the unit to kilometers, then watches a failed category change roll back.

use record_store::tracing::setup_tracing;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, Instrument};
use workspace_sample::api_actor::commands;
use workspace_sample::lifecycle::{SystemConfig, WorkspaceSystem};
use workspace_sample::model::{
    policy_key, CustomUnit, DistanceUnit, Policy, PolicyRole, PolicyType, UnitAttributes,
};
use workspace_sample::navigation::{Navigator, Route};
use workspace_sample::pages::{CreateDistanceRatePage, DistanceRatesSettingsPage, Screen};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting workspace sample");

    let system = WorkspaceSystem::new(SystemConfig {
        api_latency: Duration::from_millis(20),
        ..SystemConfig::default()
    });

    let unit = CustomUnit {
        custom_unit_id: "39C3FF491F559".to_string(),
        name: "Distance".to_string(),
        attributes: UnitAttributes {
            unit: DistanceUnit::Mi,
        },
        ..Default::default()
    };
    let policy = Policy {
        id: "A1B2C3".to_string(),
        name: "Road Trip Inc.".to_string(),
        policy_type: PolicyType::Corporate,
        role: PolicyRole::Admin,
        output_currency: "USD".to_string(),
        are_categories_enabled: true,
        are_distance_rates_enabled: true,
        custom_units: BTreeMap::from([(unit.custom_unit_id.clone(), unit)]),
        ..Default::default()
    };
    system
        .store
        .set_as(&policy_key(&policy.id), &policy)
        .map_err(|e| e.to_string())?;

    let create = Route::CreateDistanceRate {
        policy_id: policy.id.clone(),
    };
    system.navigator.navigate(create.clone());

    let span = tracing::info_span!("create_rate");
    async {
        let mut page = CreateDistanceRatePage::mount(system.context(), create.params());
        page.set_rate("0.67");
        match page.submit().await {
            Ok(()) => info!(route = %system.navigator.current(), "Rate created"),
            Err(e) => error!(error = %e, "Rate creation failed"),
        }
        page.close();
    }
    .instrument(span)
    .await;

    let settings = Route::DistanceRatesSettings {
        policy_id: policy.id.clone(),
    };
    system.navigator.navigate(settings.clone());
    let page = DistanceRatesSettingsPage::mount(system.context(), settings.params());

    page.set_unit(DistanceUnit::Km)
        .await
        .map_err(|e| e.to_string())?;

    system
        .api
        .fail_command(
            commands::SET_POLICY_DISTANCE_RATES_DEFAULT_CATEGORY,
            "Category does not exist",
        )
        .await
        .map_err(|e| e.to_string())?;
    if let Err(e) = page.set_default_category("Mileage").await {
        error!(error = %e, "Default category change failed");
    }

    if let Screen::Content(view) = page.render() {
        info!(
            unit = %view.unit.value,
            category = ?view.default_category.as_ref().and_then(|row| row.value.clone()),
            errors = ?view.default_category.as_ref().map(|row| row.errors.clone()),
            "Settings"
        );
    }
    page.close();

    let history = system.api.history().await.map_err(|e| e.to_string())?;
    info!(writes = history.len(), "Server accepted writes");

    system.shutdown().await?;

    info!("Sample completed successfully");
    Ok(())
}
