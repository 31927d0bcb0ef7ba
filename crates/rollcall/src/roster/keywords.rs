//! Header keywords used to locate roster columns.
//!
//! Every field has two keyword sets: whole-cell synonyms, which win when
//! present anywhere in the header row, and substrings, which are only
//! consulted when no synonym matched. Both sets cover Latin and Arabic
//! spellings and are compared against the trimmed, lowercased header text.

use super::RosterField;

/// Keyword sets for a single roster field.
#[derive(Debug, Clone, Copy)]
pub struct FieldKeywords {
    /// The field these keywords locate.
    pub field: RosterField,

    /// Header values that name the field exactly.
    pub exact: &'static [&'static str],

    /// Fragments that identify the field when contained in a header.
    pub contains: &'static [&'static str],
}

impl FieldKeywords {
    /// Check if the normalized header equals one of the synonyms.
    #[must_use]
    pub fn matches_exact(&self, normalized: &str) -> bool {
        self.exact.iter().any(|k| *k == normalized)
    }

    /// Check if the normalized header contains one of the fragments.
    #[must_use]
    pub fn matches_substring(&self, normalized: &str) -> bool {
        self.contains.iter().any(|k| normalized.contains(k))
    }

    /// Check if the normalized header matches this field at all.
    #[must_use]
    pub fn matches(&self, normalized: &str) -> bool {
        self.matches_exact(normalized) || self.matches_substring(normalized)
    }
}

const IDENTIFIER: FieldKeywords = FieldKeywords {
    field: RosterField::Identifier,
    exact: &[
        "iqama",
        "iqama number",
        "iqama no",
        "id",
        "identifier",
        "employee id",
        "الإقامة",
        "رقم الإقامة",
        "رقم الاقامة",
        "الهوية",
        "رقم الهوية",
    ],
    contains: &["iqama", "identifier", "إقامة", "اقامة"],
};

const NAME: FieldKeywords = FieldKeywords {
    field: RosterField::Name,
    exact: &["name", "full name", "employee name", "الاسم", "اسم", "نامه"],
    contains: &["name", "اسم", "نامه"],
};

const PASSPORT: FieldKeywords = FieldKeywords {
    field: RosterField::Passport,
    exact: &[
        "passport",
        "passport number",
        "passport no",
        "جواز السفر",
        "رقم الجواز",
    ],
    contains: &["passport", "جواز"],
};

const NATIONALITY: FieldKeywords = FieldKeywords {
    field: RosterField::Nationality,
    exact: &["nationality", "جنسية", "الجنسية"],
    contains: &["nationality", "جنسية"],
};

/// Get the keyword sets for a field.
#[must_use]
pub fn field_keywords(field: RosterField) -> &'static FieldKeywords {
    match field {
        RosterField::Identifier => &IDENTIFIER,
        RosterField::Name => &NAME,
        RosterField::Passport => &PASSPORT,
        RosterField::Nationality => &NATIONALITY,
    }
}

/// Normalize a header cell for keyword comparison.
#[must_use]
pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
