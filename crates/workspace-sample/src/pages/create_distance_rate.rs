//! # Create Distance Rate
//!
//! A one-input form: the rate per distance unit, typed in the user's locale. The form is not
//! bound to a record. Its submitter turns the draft into a [`Rate`] and runs
//! [`create_policy_distance_rate`], so the new rate shows up (pending) in every view of the
//! policy before the server answers. The page goes back once the server accepts.

use super::{check_access, load_policy, AccessDenied, AccessGuard, PageContext, PageError, Screen};
use crate::actions::{create_policy_distance_rate, generate_custom_unit_id};
use crate::model::{Rate, CUSTOM_UNIT_RATE_BASE_OFFSET, DEFAULT_RATE_NAME, POLICY};
use crate::validation::{rate_errors, validate_rate_value, RATE_INPUT};
use record_store::{
    submit_fn, Consumer, Draft, Fields, Form, FormState, KeyResolver, LiveValue, Patch, RouteParams,
    SubmitError,
};
use serde_json::json;
use tracing::{debug, instrument};

pub const FORM_ID: &str = "policyCreateDistanceRateForm";

const GUARDS: [AccessGuard; 2] = [AccessGuard::Admin, AccessGuard::PaidPolicy];

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRateView {
    pub title: String,
    pub submit_label: String,
    pub currency: String,
    /// What the user typed.
    pub rate: String,
    pub error: Option<String>,
    pub submitting: bool,
    pub submit_error: Option<String>,
}

pub struct CreateDistanceRatePage {
    ctx: PageContext,
    consumer: Consumer,
    policy: LiveValue,
    form: Form,
}

impl CreateDistanceRatePage {
    pub fn mount(ctx: PageContext, params: RouteParams) -> Self {
        let mut consumer = Consumer::mount(&ctx.store, "CreateDistanceRatePage", params);
        let policy = consumer.bind(KeyResolver::from_param("policyID", POLICY));

        let validator = {
            let policy = policy.clone();
            let localizer = ctx.localizer.clone();
            move |values: &Draft| {
                let currency = load_policy(&policy)
                    .map(|p| p.currency().to_string())
                    .unwrap_or_default();
                rate_errors(values, &currency, localizer.decimal_separator())
            }
        };

        let submitter = {
            let ctx = ctx.clone();
            let policy = policy.clone();
            let rate_id = generate_custom_unit_id();
            submit_fn(move |patch: Patch| {
                let ctx = ctx.clone();
                let policy = load_policy(&policy);
                let rate_id = rate_id.clone();
                async move {
                    let policy = policy.ok_or_else(|| SubmitError::new("Workspace not loaded"))?;
                    let unit = policy
                        .distance_unit()
                        .ok_or_else(|| SubmitError::new(AccessDenied::MissingCustomUnit.to_string()))?;
                    let input = patch.get(RATE_INPUT).and_then(|v| v.as_str()).unwrap_or_default();
                    let value =
                        validate_rate_value(input, policy.currency(), ctx.localizer.decimal_separator())
                            .map_err(SubmitError::new)?;
                    let rate = Rate {
                        custom_unit_rate_id: rate_id,
                        name: DEFAULT_RATE_NAME.to_string(),
                        rate: value * CUSTOM_UNIT_RATE_BASE_OFFSET,
                        currency: policy.currency().to_string(),
                        enabled: true,
                        ..Default::default()
                    };
                    create_policy_distance_rate(
                        &ctx.store,
                        ctx.remote.as_ref(),
                        &policy.id,
                        &unit.custom_unit_id,
                        &rate,
                    )
                    .await?;
                    ctx.navigator.go_back();
                    Ok(())
                }
            })
        };

        let mut defaults = Fields::new();
        defaults.insert(RATE_INPUT.to_string(), json!(""));
        let form = Form::new(FORM_ID, &ctx.store, submitter)
            .with_inputs([RATE_INPUT])
            .with_defaults(defaults)
            .with_validator(validator);

        Self {
            ctx,
            consumer,
            policy,
            form,
        }
    }

    pub fn render(&self) -> Screen<CreateRateView> {
        let policy = load_policy(&self.policy);
        let Ok(policy) = check_access(policy.as_ref(), &GUARDS) else {
            return self.ctx.not_found();
        };
        let rate = self
            .form
            .values()
            .map(|values| values.text(RATE_INPUT).to_string())
            .unwrap_or_default();
        Screen::Content(CreateRateView {
            title: self.ctx.translate("workspace.distanceRates.addRate"),
            submit_label: self.ctx.translate("common.save"),
            currency: policy.currency().to_string(),
            rate,
            error: self
                .form
                .field_state(RATE_INPUT)
                .error
                .map(|key| self.ctx.translate(&key)),
            submitting: self.form.state() == FormState::Submitting,
            submit_error: self
                .form
                .submit_error()
                .map(|e| self.ctx.translate(e.message())),
        })
    }

    pub fn set_rate(&mut self, input: &str) {
        self.form.set_field(RATE_INPUT, input);
    }

    /// Creates the rate. Navigation back happens inside the submitter on success.
    #[instrument(skip(self), fields(consumer = %self.consumer.name()))]
    pub async fn submit(&mut self) -> Result<(), PageError> {
        let policy = load_policy(&self.policy);
        let policy = check_access(policy.as_ref(), &GUARDS)?;
        if policy.distance_unit().is_none() {
            return Err(AccessDenied::MissingCustomUnit.into());
        }
        debug!(policy_id = %policy.id, "Creating rate");
        self.form.submit().await?;
        Ok(())
    }

    pub fn form_state(&self) -> FormState {
        self.form.state()
    }

    pub fn set_params(&mut self, params: RouteParams) {
        self.consumer.set_params(params);
    }

    pub fn close(self) {
        self.form.discard();
        self.consumer.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_actor::commands;
    use crate::localize::{Locale, StaticLocalizer};
    use crate::model::{policy_key, CustomUnit, Policy, PolicyRole, PolicyType};
    use crate::navigation::{NavigationEvent, NavigationLog, Navigator, Route};
    use crate::validation::LOW_RATE_ERROR;
    use record_store::mock::MockRemote;
    use record_store::{PendingAction, RecordStore};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct Fixture {
        store: RecordStore,
        remote: Arc<MockRemote>,
        navigator: Arc<NavigationLog>,
        ctx: PageContext,
    }

    fn fixture(locale: Locale) -> Fixture {
        let store = RecordStore::new();
        let remote = Arc::new(MockRemote::new());
        let navigator = Arc::new(NavigationLog::new());
        let ctx = PageContext {
            store: store.clone(),
            remote: remote.clone(),
            navigator: navigator.clone(),
            localizer: Arc::new(StaticLocalizer::new(locale)),
        };
        Fixture {
            store,
            remote,
            navigator,
            ctx,
        }
    }

    fn seed_policy(store: &RecordStore, role: PolicyRole) {
        let unit = CustomUnit {
            custom_unit_id: "U1".into(),
            name: "Distance".into(),
            ..Default::default()
        };
        let policy = Policy {
            id: "P1".into(),
            role,
            policy_type: PolicyType::Corporate,
            output_currency: "EUR".into(),
            custom_units: BTreeMap::from([("U1".to_string(), unit)]),
            ..Default::default()
        };
        store.set_as(&policy_key("P1"), &policy).unwrap();
    }

    fn params() -> RouteParams {
        Route::CreateDistanceRate {
            policy_id: "P1".into(),
        }
        .params()
    }

    #[tokio::test]
    async fn test_creates_rate_and_goes_back() {
        let f = fixture(Locale::En);
        seed_policy(&f.store, PolicyRole::Admin);
        f.remote
            .expect_write(commands::CREATE_POLICY_DISTANCE_RATE)
            .return_ok();
        f.navigator.navigate(Route::CreateDistanceRate {
            policy_id: "P1".into(),
        });

        let mut page = CreateDistanceRatePage::mount(f.ctx.clone(), params());
        let view = page.render();
        assert_eq!(view.content().unwrap().currency, "EUR");

        page.set_rate("12.5");
        page.submit().await.unwrap();

        let policy: Policy = f.store.get_as(&policy_key("P1")).unwrap().unwrap();
        let rates = &policy.custom_units["U1"].rates;
        assert_eq!(rates.len(), 1);
        let rate = rates.values().next().unwrap();
        assert_eq!(rate.rate, 1250.0);
        assert_eq!(rate.currency, "EUR");
        assert_eq!(rate.name, DEFAULT_RATE_NAME);
        assert_eq!(rate.pending_action, None);

        assert_eq!(f.navigator.events().last(), Some(&NavigationEvent::GoBack));
        assert_eq!(page.form_state(), FormState::Submitted);
        f.remote.verify();
        page.close();
    }

    #[tokio::test]
    async fn test_invalid_rate_shows_translated_error() {
        let f = fixture(Locale::En);
        seed_policy(&f.store, PolicyRole::Admin);
        let mut page = CreateDistanceRatePage::mount(f.ctx.clone(), params());

        page.set_rate("0");
        let view = page.render();
        let view = view.content().unwrap();
        assert_eq!(
            view.error.as_deref(),
            Some(f.ctx.translate(LOW_RATE_ERROR).as_str())
        );

        assert!(matches!(page.submit().await, Err(PageError::Form(_))));
        assert!(f.remote.received().is_empty());
    }

    #[tokio::test]
    async fn test_spanish_locale_accepts_comma() {
        let f = fixture(Locale::Es);
        seed_policy(&f.store, PolicyRole::Admin);
        f.remote
            .expect_write(commands::CREATE_POLICY_DISTANCE_RATE)
            .return_ok();
        let mut page = CreateDistanceRatePage::mount(f.ctx.clone(), params());

        page.set_rate("1,5");
        page.submit().await.unwrap();

        let policy: Policy = f.store.get_as(&policy_key("P1")).unwrap().unwrap();
        let rate = policy.custom_units["U1"].rates.values().next().unwrap().clone();
        assert_eq!(rate.rate, 150.0);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_rate_with_error() {
        let f = fixture(Locale::En);
        seed_policy(&f.store, PolicyRole::Admin);
        f.remote
            .expect_write(commands::CREATE_POLICY_DISTANCE_RATE)
            .return_err(SubmitError::new("common.genericErrorMessage"));
        let mut page = CreateDistanceRatePage::mount(f.ctx.clone(), params());

        page.set_rate("2");
        assert!(matches!(page.submit().await, Err(PageError::Form(_))));

        let policy: Policy = f.store.get_as(&policy_key("P1")).unwrap().unwrap();
        let rate = policy.custom_units["U1"].rates.values().next().unwrap().clone();
        assert_eq!(rate.pending_action, Some(PendingAction::Add));
        assert!(rate.errors.is_some());

        assert_eq!(page.form_state(), FormState::Error);
        let view = page.render();
        let view = view.content().unwrap();
        assert_eq!(view.rate, "2");
        assert_eq!(
            view.submit_error.as_deref(),
            Some(f.ctx.translate("common.genericErrorMessage").as_str())
        );
        assert!(f.navigator.events().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_sees_not_found() {
        let f = fixture(Locale::En);
        seed_policy(&f.store, PolicyRole::User);
        let mut page = CreateDistanceRatePage::mount(f.ctx.clone(), params());

        assert!(page.render().is_not_found());
        page.set_rate("1");
        assert!(matches!(
            page.submit().await,
            Err(PageError::AccessDenied(AccessDenied::NotAdmin))
        ));
    }

    #[tokio::test]
    async fn test_policy_arriving_later_unlocks_page() {
        let f = fixture(Locale::En);
        let page = CreateDistanceRatePage::mount(f.ctx.clone(), params());
        assert!(page.render().is_not_found());

        seed_policy(&f.store, PolicyRole::Admin);
        assert!(!page.render().is_not_found());
    }
}
