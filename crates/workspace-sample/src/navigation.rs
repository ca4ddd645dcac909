//! # Navigation
//!
//! Pages never own the navigation stack; they ask a [`Navigator`] to move. [`NavigationLog`]
//! is the in-process navigator: it keeps the stack and records every request.

use record_store::RouteParams;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    DistanceRates { policy_id: String },
    CreateDistanceRate { policy_id: String },
    DistanceRatesSettings { policy_id: String },
}

impl Route {
    /// Route parameters the page bound to this route receives.
    pub fn params(&self) -> RouteParams {
        match self {
            Route::Home => RouteParams::new(),
            Route::DistanceRates { policy_id }
            | Route::CreateDistanceRate { policy_id }
            | Route::DistanceRatesSettings { policy_id } => {
                RouteParams::from([("policyID".to_string(), policy_id.clone())])
            }
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Home => write!(f, "home"),
            Route::DistanceRates { policy_id } => write!(f, "workspace/{}/distance-rates", policy_id),
            Route::CreateDistanceRate { policy_id } => {
                write!(f, "workspace/{}/distance-rates/new", policy_id)
            }
            Route::DistanceRatesSettings { policy_id } => {
                write!(f, "workspace/{}/distance-rates/settings", policy_id)
            }
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
    fn go_back(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Navigate(Route),
    GoBack,
}

#[derive(Debug)]
pub struct NavigationLog {
    inner: Mutex<LogState>,
}

#[derive(Debug)]
struct LogState {
    stack: Vec<Route>,
    events: Vec<NavigationEvent>,
}

impl Default for NavigationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationLog {
    /// Starts on [`Route::Home`].
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LogState {
                stack: vec![Route::Home],
                events: Vec::new(),
            }),
        }
    }

    pub fn current(&self) -> Route {
        self.state().stack.last().cloned().unwrap_or(Route::Home)
    }

    pub fn events(&self) -> Vec<NavigationEvent> {
        self.state().events.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LogState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, route: Route) {
        info!(%route, "Navigate");
        let mut state = self.state();
        if route == Route::Home {
            state.stack.clear();
        }
        state.stack.push(route.clone());
        state.events.push(NavigationEvent::Navigate(route));
    }

    fn go_back(&self) {
        let mut state = self.state();
        if state.stack.len() > 1 {
            state.stack.pop();
        }
        info!(route = %state.stack.last().cloned().unwrap_or(Route::Home), "Go back");
        state.events.push(NavigationEvent::GoBack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_returns_to_previous_route() {
        let nav = NavigationLog::new();
        let list = Route::DistanceRates {
            policy_id: "P1".into(),
        };
        nav.navigate(list.clone());
        nav.navigate(Route::CreateDistanceRate {
            policy_id: "P1".into(),
        });
        nav.go_back();
        assert_eq!(nav.current(), list);
        assert_eq!(nav.events().len(), 3);
    }

    #[test]
    fn test_home_resets_stack() {
        let nav = NavigationLog::new();
        nav.navigate(Route::DistanceRates {
            policy_id: "P1".into(),
        });
        nav.navigate(Route::Home);
        nav.go_back();
        assert_eq!(nav.current(), Route::Home);
    }

    #[test]
    fn test_route_params_carry_policy_id() {
        let route = Route::DistanceRatesSettings {
            policy_id: "P9".into(),
        };
        assert_eq!(route.params().get("policyID").map(String::as_str), Some("P9"));
        assert_eq!(route.to_string(), "workspace/P9/distance-rates/settings");
    }
}
