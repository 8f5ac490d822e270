//! Edit forms for each record type.
//!
//! A form is the JSON body of a create/update request. `validate` checks
//! everything that can be checked without the database; foreign keys are
//! resolved by the handlers.

use serde::Deserialize;
use thiserror::Error;

pub const SHORT_NAME_MAX: usize = 20;
pub const FULL_NAME_MAX: usize = 200;
pub const PUBLISHER_NAME_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} must be at least 1")]
    NotPositive(&'static str),

    #[error("a passage needs at least one reference")]
    EmptyPassage,
}

fn required(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), FormError> {
    if value.chars().count() > max {
        return Err(FormError::TooLong { field, max });
    }
    Ok(())
}

fn positive(field: &'static str, value: u32) -> Result<(), FormError> {
    if value == 0 {
        return Err(FormError::NotPositive(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionForm {
    pub short_name: String,
    pub full_name: String,
    pub publisher_name: String,
    pub permission_to_quote: String,
    pub copyright: String,
}

impl VersionForm {
    pub fn validate(&self) -> Result<(), FormError> {
        required("short_name", &self.short_name)?;
        max_len("short_name", &self.short_name, SHORT_NAME_MAX)?;
        required("full_name", &self.full_name)?;
        max_len("full_name", &self.full_name, FULL_NAME_MAX)?;
        required("publisher_name", &self.publisher_name)?;
        max_len("publisher_name", &self.publisher_name, PUBLISHER_NAME_MAX)?;
        required("permission_to_quote", &self.permission_to_quote)?;
        required("copyright", &self.copyright)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceForm {
    pub chapter: u32,
    pub verse: u32,
}

impl ReferenceForm {
    pub fn validate(&self) -> Result<(), FormError> {
        positive("chapter", self.chapter)?;
        positive("verse", self.verse)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerseForm {
    pub reference_id: i64,
    pub version_id: i64,
    pub scripture: String,
}

impl VerseForm {
    pub fn validate(&self) -> Result<(), FormError> {
        required("scripture", &self.scripture)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassageForm {
    pub version_id: i64,
    pub reference_ids: Vec<i64>,
}

impl PassageForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.reference_ids.is_empty() {
            return Err(FormError::EmptyPassage);
        }
        Ok(())
    }

    /// Reference ids with duplicates removed, first occurrence kept.
    pub fn unique_reference_ids(&self) -> Vec<i64> {
        let mut seen = Vec::with_capacity(self.reference_ids.len());
        for id in &self.reference_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }
}

/// Partial update of the caller's own profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileForm {
    pub default_version_id: Option<i64>,
    pub show_references: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version_form() -> VersionForm {
        VersionForm {
            short_name: "NASB".into(),
            full_name: "New American Standard Bible".into(),
            publisher_name: "The Lockman Foundation".into(),
            permission_to_quote: "Up to 500 verses may be quoted.".into(),
            copyright: "Copyright The Lockman Foundation".into(),
        }
    }

    #[test]
    fn version_form_accepts_complete_input() {
        assert_eq!(version_form().validate(), Ok(()));
    }

    #[test]
    fn version_form_limits() {
        let mut form = version_form();
        form.short_name = "x".repeat(SHORT_NAME_MAX + 1);
        assert_eq!(
            form.validate(),
            Err(FormError::TooLong {
                field: "short_name",
                max: SHORT_NAME_MAX
            })
        );

        let mut form = version_form();
        form.copyright = "   ".into();
        assert_eq!(form.validate(), Err(FormError::Required("copyright")));
    }

    #[test]
    fn reference_form_rejects_zero() {
        assert_eq!(ReferenceForm { chapter: 3, verse: 1 }.validate(), Ok(()));
        assert_eq!(
            ReferenceForm { chapter: 0, verse: 1 }.validate(),
            Err(FormError::NotPositive("chapter"))
        );
        assert_eq!(
            ReferenceForm { chapter: 1, verse: 0 }.validate(),
            Err(FormError::NotPositive("verse"))
        );
    }

    #[test]
    fn passage_form_needs_references() {
        let form = PassageForm {
            version_id: 1,
            reference_ids: vec![],
        };
        assert_eq!(form.validate(), Err(FormError::EmptyPassage));

        let form = PassageForm {
            version_id: 1,
            reference_ids: vec![4, 2, 4, 9, 2],
        };
        assert_eq!(form.validate(), Ok(()));
        assert_eq!(form.unique_reference_ids(), vec![4, 2, 9]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<ReferenceForm>(r#"{"chapter":1,"verse":2,"book":"Job"}"#);
        assert!(err.is_err());
    }
}
