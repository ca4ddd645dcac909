//! # Localization
//!
//! Pages store translation keys (`workspace.reimburse.lowRateError`) and only turn them
//! into text when rendering, through a [`Localizer`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

pub trait Localizer: Send + Sync {
    /// Text for `key`; unknown keys come back unchanged.
    fn translate(&self, key: &str) -> String;
    fn decimal_separator(&self) -> char;
}

/// Built-in tables for the keys the workspace pages use.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocalizer {
    locale: Locale,
}

impl StaticLocalizer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl Localizer for StaticLocalizer {
    fn translate(&self, key: &str) -> String {
        let text = match self.locale {
            Locale::En => english(key),
            Locale::Es => spanish(key).or_else(|| english(key)),
        };
        text.map(str::to_string).unwrap_or_else(|| key.to_string())
    }

    fn decimal_separator(&self) -> char {
        match self.locale {
            Locale::En => '.',
            Locale::Es => ',',
        }
    }
}

fn english(key: &str) -> Option<&'static str> {
    Some(match key {
        "common.save" => "Save",
        "common.genericErrorMessage" => "Oops... something went wrong and your request could not be completed. Please try again later.",
        "chatYouLookingForCannotBeFound" => "The chat you are looking for cannot be found.",
        "getMeOutOfHere" => "Get me out of here",
        "workspace.common.settings" => "Settings",
        "workspace.distanceRates.addRate" => "Add rate",
        "workspace.distanceRates.unit" => "Unit",
        "workspace.distanceRates.defaultCategory" => "Default category",
        "workspace.reimburse.invalidRateError" => "Please enter a valid rate",
        "workspace.reimburse.lowRateError" => "Rate must be greater than 0",
        _ => return None,
    })
}

fn spanish(key: &str) -> Option<&'static str> {
    Some(match key {
        "common.save" => "Guardar",
        "getMeOutOfHere" => "Sácame de aquí",
        "workspace.common.settings" => "Configuración",
        "workspace.distanceRates.addRate" => "Agregar tasa",
        "workspace.distanceRates.unit" => "Unidad",
        "workspace.reimburse.invalidRateError" => "Por favor, introduce una tasa válida",
        "workspace.reimburse.lowRateError" => "La tasa debe ser mayor que 0",
        _ => return None,
    })
}

/// Minor-unit digits of `currency` (ISO 4217).
pub fn currency_decimals(currency: &str) -> u32 {
    match currency {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}
