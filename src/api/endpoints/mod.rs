//! API endpoint handlers.

pub mod health;
pub mod i18n;
pub mod preferences;
pub mod reports;
