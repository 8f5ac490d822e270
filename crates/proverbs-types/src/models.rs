use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::passage::PassageRange;

/// A translation of Proverbs (NIV, NASB, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub short_name: String,
    pub full_name: String,
    pub publisher_name: String,
    /// Usually found on the copyright page.
    pub permission_to_quote: String,
    pub copyright: String,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Position of a verse within the book. Field order matters: the derived
/// ordering compares chapter first, then verse.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChapterVerse {
    pub chapter: u32,
    pub verse: u32,
}

impl ChapterVerse {
    pub const fn new(chapter: u32, verse: u32) -> Self {
        Self { chapter, verse }
    }
}

impl From<(u32, u32)> for ChapterVerse {
    fn from((chapter, verse): (u32, u32)) -> Self {
        Self { chapter, verse }
    }
}

impl fmt::Display for ChapterVerse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// A stored chapter/verse reference, e.g. `3:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: i64,
    pub chapter: u32,
    pub verse: u32,
}

impl Reference {
    pub fn position(&self) -> ChapterVerse {
        ChapterVerse::new(self.chapter, self.verse)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.position(), f)
    }
}

/// One verse of scripture in one translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub id: i64,
    pub reference: Reference,
    pub version_id: i64,
    pub version_full_name: String,
    pub scripture: String,
}

impl fmt::Display for Verse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.version_full_name)
    }
}

/// A set of related references read in a single translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: i64,
    pub version_id: i64,
    pub references: Vec<Reference>,
}

impl Passage {
    pub fn range(&self) -> PassageRange {
        PassageRange::compute(self.references.iter().map(Reference::position))
    }

    /// Human readable reference for the whole passage, e.g. `3:1 - 5`.
    pub fn reference(&self) -> String {
        self.range().to_string()
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.range(), f)
    }
}

/// Per-user settings plus the registration activation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub default_version_id: i64,
    pub show_references: bool,
    #[serde(skip_serializing, default)]
    pub activation_key: String,
    pub key_expires: DateTime<Utc>,
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: i64, chapter: u32, verse: u32) -> Reference {
        Reference { id, chapter, verse }
    }

    #[test]
    fn chapter_verse_orders_by_chapter_then_verse() {
        let mut refs = vec![
            ChapterVerse::new(4, 1),
            ChapterVerse::new(3, 9),
            ChapterVerse::new(3, 2),
            ChapterVerse::new(10, 1),
        ];
        refs.sort();
        assert_eq!(
            refs,
            vec![
                ChapterVerse::new(3, 2),
                ChapterVerse::new(3, 9),
                ChapterVerse::new(4, 1),
                ChapterVerse::new(10, 1),
            ]
        );
    }

    #[test]
    fn display_strings() {
        let version = Version {
            id: 1,
            short_name: "NIV".into(),
            full_name: "New International Version - 1984".into(),
            publisher_name: "Zondervan".into(),
            permission_to_quote: String::new(),
            copyright: String::new(),
        };
        assert_eq!(version.to_string(), "New International Version - 1984");

        let verse = Verse {
            id: 7,
            reference: reference(3, 3, 5),
            version_id: 1,
            version_full_name: version.full_name.clone(),
            scripture: "Trust in the Lord with all your heart".into(),
        };
        assert_eq!(verse.to_string(), "3:5 (New International Version - 1984)");
    }

    #[test]
    fn passage_reference_is_derived_from_references() {
        let passage = Passage {
            id: 1,
            version_id: 1,
            references: vec![reference(2, 3, 6), reference(1, 3, 5)],
        };
        assert_eq!(passage.reference(), "3:5 - 6");

        let empty = Passage {
            id: 2,
            version_id: 1,
            references: vec![],
        };
        assert_eq!(empty.reference(), "0:0");
    }

    #[test]
    fn profile_never_serializes_activation_key() {
        let profile = UserProfile {
            user_id: Uuid::nil(),
            username: "solomon".into(),
            default_version_id: 1,
            show_references: true,
            activation_key: "a".repeat(40),
            key_expires: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("activation_key").is_none());
        assert_eq!(json["username"], "solomon");
        assert_eq!(profile.to_string(), "solomon");
    }
}
