//! Translation map for report labels and preview messages.
//!
//! Two languages: English (LTR) and Arabic (RTL). The table is static and
//! built once per process; unknown keys are returned as-is.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

/// Text direction for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Language {
    pub fn direction(self) -> Direction {
        match self {
            Language::En => Direction::Ltr,
            Language::Ar => Direction::Rtl,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Short-date pattern used when rendering dates for this viewer.
    pub fn short_date_format(self) -> &'static str {
        match self {
            Language::En => "%-m/%-d/%Y",
            Language::Ar => "%-d/%-m/%Y",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

const ENTRIES: &[(&str, &str, &str)] = &[
    // (key, en, ar)
    ("report.patient", "Patient Report", "تقرير المرضى"),
    ("report.visit", "Visit Report", "تقرير الزيارات"),
    ("report.prescription", "Prescription Report", "تقرير الوصفات"),
    ("preview.select_range", "Select a date range and report type to preview.", "اختر نطاق التاريخ ونوع التقرير للمعاينة."),
    ("preview.loading", "Loading report...", "جارٍ تحميل التقرير..."),
    ("preview.empty", "No matching records for the selected filters.", "لا توجد سجلات مطابقة للفلاتر المحددة."),
    ("preview.error", "Failed to load report data.", "فشل تحميل بيانات التقرير."),
    ("column.name", "Name", "الاسم"),
    ("column.patient", "Patient", "المريض"),
    ("column.phone", "Phone", "الهاتف"),
    ("column.age", "Age", "العمر"),
    ("column.address", "Address", "العنوان"),
    ("column.registration_date", "Registration Date", "تاريخ التسجيل"),
    ("column.date", "Date", "التاريخ"),
    ("column.visit_type", "Visit Type", "نوع الزيارة"),
    ("column.complaint", "Complaint", "الشكوى"),
    ("column.diagnosis", "Diagnosis", "التشخيص"),
    ("column.drug", "Drug", "الدواء"),
    ("column.frequency", "Frequency", "التكرار"),
    ("column.period", "Period", "المدة"),
    ("column.timing", "Timing", "التوقيت"),
];

fn table() -> &'static HashMap<&'static str, (&'static str, &'static str)> {
    static TABLE: OnceLock<HashMap<&'static str, (&'static str, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ENTRIES
            .iter()
            .map(|(key, en, ar)| (*key, (*en, *ar)))
            .collect()
    })
}

/// Look up a localized string. Unknown keys are returned verbatim.
pub fn translate(lang: Language, key: &str) -> String {
    match table().get(key) {
        Some((en, ar)) => match lang {
            Language::En => en.to_string(),
            Language::Ar => ar.to_string(),
        },
        None => key.to_string(),
    }
}

/// All strings for one language, keyed by translation key.
pub fn strings_for(lang: Language) -> HashMap<&'static str, &'static str> {
    ENTRIES
        .iter()
        .map(|(key, en, ar)| {
            let text = match lang {
                Language::En => *en,
                Language::Ar => *ar,
            };
            (*key, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_is_rtl_english_is_ltr() {
        assert_eq!(Language::Ar.direction(), Direction::Rtl);
        assert_eq!(Language::En.direction(), Direction::Ltr);
    }

    #[test]
    fn translate_known_key() {
        assert_eq!(translate(Language::En, "column.drug"), "Drug");
        assert_eq!(translate(Language::Ar, "column.drug"), "الدواء");
    }

    #[test]
    fn translate_unknown_key_returns_key() {
        assert_eq!(translate(Language::Ar, "no.such.key"), "no.such.key");
    }

    #[test]
    fn every_key_has_both_languages() {
        let en = strings_for(Language::En);
        let ar = strings_for(Language::Ar);
        assert_eq!(en.len(), ENTRIES.len());
        assert_eq!(en.len(), ar.len());
        assert!(ar.values().all(|v| !v.is_empty()));
    }

    #[test]
    fn parse_language_codes() {
        assert_eq!("ar".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!(" EN ".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn short_date_format_differs_by_language() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(date.format(Language::En.short_date_format()).to_string(), "1/31/2024");
        assert_eq!(date.format(Language::Ar.short_date_format()).to_string(), "31/1/2024");
    }
}
