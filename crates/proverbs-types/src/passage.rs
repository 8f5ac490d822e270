use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ChapterVerse;

/// First and last verse covered by a passage.
///
/// An empty passage has both ends at `0:0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRange {
    pub start: ChapterVerse,
    pub end: ChapterVerse,
}

impl PassageRange {
    /// Single pass over the references, keeping the running minimum and
    /// maximum. Input order does not matter and nothing is sorted.
    pub fn compute<I>(refs: I) -> Self
    where
        I: IntoIterator<Item = ChapterVerse>,
    {
        let mut refs = refs.into_iter();
        let Some(first) = refs.next() else {
            return Self::default();
        };

        let (start, end) = refs.fold((first, first), |(min, max), cv| {
            (min.min(cv), max.max(cv))
        });

        Self { start, end }
    }

    pub fn is_single_verse(&self) -> bool {
        self.start == self.end
    }

    /// `(min_chapter, min_verse, max_chapter, max_verse)`
    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (
            self.start.chapter,
            self.start.verse,
            self.end.chapter,
            self.end.verse,
        )
    }
}

impl fmt::Display for PassageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_verse() {
            write!(f, "{}", self.start)
        } else if self.start.chapter == self.end.chapter {
            write!(f, "{} - {}", self.start, self.end.verse)
        } else {
            write!(f, "{} - {}", self.start, self.end)
        }
    }
}

/// Lowest and highest `(chapter, verse)` in `refs`, flattened to
/// `(min_chapter, min_verse, max_chapter, max_verse)`. Returns all zeros
/// for an empty input.
pub fn min_max_verse<I>(refs: I) -> (u32, u32, u32, u32)
where
    I: IntoIterator<Item = (u32, u32)>,
{
    PassageRange::compute(refs.into_iter().map(ChapterVerse::from)).as_tuple()
}
