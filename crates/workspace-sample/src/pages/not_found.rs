use crate::localize::Localizer;
use crate::navigation::{Navigator, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundView {
    pub header: String,
    pub body: String,
    pub button: String,
}

/// The 404 screen. Its only button leads home.
pub struct NotFoundPage;

impl NotFoundPage {
    pub fn render(localizer: &dyn Localizer) -> NotFoundView {
        NotFoundView {
            header: "404".to_string(),
            body: localizer.translate("chatYouLookingForCannotBeFound"),
            button: localizer.translate("getMeOutOfHere"),
        }
    }

    pub fn press_button(navigator: &dyn Navigator) {
        navigator.navigate(Route::Home);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::{Locale, StaticLocalizer};
    use crate::navigation::{NavigationEvent, NavigationLog};

    #[test]
    fn test_renders_translated_text() {
        let view = NotFoundPage::render(&StaticLocalizer::new(Locale::En));
        assert_eq!(view.header, "404");
        assert_eq!(view.button, "Get me out of here");
    }

    #[test]
    fn test_button_goes_home() {
        let nav = NavigationLog::new();
        nav.navigate(Route::DistanceRates {
            policy_id: "P1".into(),
        });
        NotFoundPage::press_button(&nav);
        assert_eq!(nav.current(), Route::Home);
        assert_eq!(nav.events().last(), Some(&NavigationEvent::Navigate(Route::Home)));
    }
}
