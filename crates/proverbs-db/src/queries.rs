use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, Row};

use proverbs_types::forms::{VerseForm, VersionForm};
use proverbs_types::models::{Passage, Reference, Verse, Version};

use crate::Database;

const VERSION_COLUMNS: &str =
    "id, short_name, full_name, publisher_name, permission_to_quote, copyright";

const VERSE_SELECT: &str = "SELECT vs.id, r.id, r.chapter, r.verse, v.id, v.full_name, vs.scripture
     FROM verses vs
     JOIN scripture_references r ON r.id = vs.reference_id
     JOIN versions v ON v.id = vs.version_id";

impl Database {
    // -- Versions --

    pub fn insert_version(&self, form: &VersionForm) -> Result<Version> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO versions (short_name, full_name, publisher_name, permission_to_quote, copyright)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    form.short_name,
                    form.full_name,
                    form.publisher_name,
                    form.permission_to_quote,
                    form.copyright
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_version(conn, id)?.ok_or_else(|| anyhow::anyhow!("Version {} vanished", id))
        })
    }

    pub fn get_version(&self, id: i64) -> Result<Option<Version>> {
        self.with_conn(|conn| query_version(conn, id))
    }

    pub fn get_version_by_full_name(&self, full_name: &str) -> Result<Option<Version>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM versions WHERE full_name = ?1 ORDER BY id LIMIT 1",
                VERSION_COLUMNS
            );
            conn.query_row(&sql, [full_name], version_from_row).optional()
        })
    }

    pub fn list_versions(&self) -> Result<Vec<Version>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM versions ORDER BY full_name, id", VERSION_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], version_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_version(&self, id: i64, form: &VersionForm) -> Result<Option<Version>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE versions
                 SET short_name = ?2, full_name = ?3, publisher_name = ?4,
                     permission_to_quote = ?5, copyright = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    form.short_name,
                    form.full_name,
                    form.publisher_name,
                    form.permission_to_quote,
                    form.copyright
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_version(conn, id)
        })
    }

    /// Fails with a constraint violation while verses, passages or
    /// profiles still use the version.
    pub fn delete_version(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM versions WHERE id = ?1", [id])? > 0))
    }

    // -- References --

    pub fn insert_reference(&self, chapter: u32, verse: u32) -> Result<Reference> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO scripture_references (chapter, verse) VALUES (?1, ?2)",
                rusqlite::params![chapter, verse],
            )?;
            Ok(Reference {
                id: conn.last_insert_rowid(),
                chapter,
                verse,
            })
        })
    }

    pub fn get_reference(&self, id: i64) -> Result<Option<Reference>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, chapter, verse FROM scripture_references WHERE id = ?1",
                [id],
                |row| reference_from_row(row, 0),
            )
            .optional()
        })
    }

    pub fn list_references(&self) -> Result<Vec<Reference>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chapter, verse FROM scripture_references ORDER BY chapter, verse, id",
            )?;
            let rows = stmt
                .query_map([], |row| reference_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ids from `ids` that have no stored reference, in input order.
    pub fn missing_references(&self, ids: &[i64]) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT 1 FROM scripture_references WHERE id = ?1")?;
            let mut missing = Vec::new();
            for id in ids {
                if !stmt.exists([id])? {
                    missing.push(*id);
                }
            }
            Ok(missing)
        })
    }

    pub fn delete_reference(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM scripture_references WHERE id = ?1", [id])? > 0)
        })
    }

    // -- Verses --

    pub fn insert_verse(&self, form: &VerseForm) -> Result<Verse> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO verses (reference_id, version_id, scripture) VALUES (?1, ?2, ?3)",
                rusqlite::params![form.reference_id, form.version_id, form.scripture],
            )?;
            let id = conn.last_insert_rowid();
            query_verse(conn, id)?.ok_or_else(|| anyhow::anyhow!("Verse {} vanished", id))
        })
    }

    pub fn get_verse(&self, id: i64) -> Result<Option<Verse>> {
        self.with_conn(|conn| query_verse(conn, id))
    }

    /// Ordered by version name, then chapter and verse.
    pub fn list_verses(&self) -> Result<Vec<Verse>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY v.full_name, r.chapter, r.verse, vs.id", VERSE_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], verse_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_verse(&self, id: i64, form: &VerseForm) -> Result<Option<Verse>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE verses SET reference_id = ?2, version_id = ?3, scripture = ?4 WHERE id = ?1",
                rusqlite::params![id, form.reference_id, form.version_id, form.scripture],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_verse(conn, id)
        })
    }

    pub fn delete_verse(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM verses WHERE id = ?1", [id])? > 0))
    }

    // -- Passages --

    pub fn insert_passage(&self, version_id: i64, reference_ids: &[i64]) -> Result<Passage> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("INSERT INTO passages (version_id) VALUES (?1)", [version_id])?;
            let id = tx.last_insert_rowid();
            attach_references(&tx, id, reference_ids)?;
            let passage = query_passage(&tx, id)?;
            tx.commit()?;
            passage.ok_or_else(|| anyhow::anyhow!("Passage {} vanished", id))
        })
    }

    pub fn get_passage(&self, id: i64) -> Result<Option<Passage>> {
        self.with_conn(|conn| query_passage(conn, id))
    }

    pub fn list_passages(&self) -> Result<Vec<Passage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, version_id FROM passages ORDER BY id")?;
            let heads = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            // One query for every attached reference instead of one per passage
            let mut stmt = conn.prepare(
                "SELECT pr.passage_id, r.id, r.chapter, r.verse
                 FROM passage_references pr
                 JOIN scripture_references r ON r.id = pr.reference_id
                 ORDER BY r.chapter, r.verse, r.id",
            )?;
            let mut by_passage: HashMap<i64, Vec<Reference>> = HashMap::new();
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, reference_from_row(row, 1)?))
            })?;
            for row in rows {
                let (passage_id, reference) = row?;
                by_passage.entry(passage_id).or_default().push(reference);
            }

            Ok(heads
                .into_iter()
                .map(|(id, version_id)| Passage {
                    id,
                    version_id,
                    references: by_passage.remove(&id).unwrap_or_default(),
                })
                .collect())
        })
    }

    /// Replace the version and the whole reference set of a passage.
    pub fn replace_passage(
        &self,
        id: i64,
        version_id: i64,
        reference_ids: &[i64],
    ) -> Result<Option<Passage>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE passages SET version_id = ?2 WHERE id = ?1",
                [id, version_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            tx.execute("DELETE FROM passage_references WHERE passage_id = ?1", [id])?;
            attach_references(&tx, id, reference_ids)?;
            let passage = query_passage(&tx, id)?;
            tx.commit()?;
            Ok(passage)
        })
    }

    pub fn delete_passage(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM passages WHERE id = ?1", [id])? > 0))
    }

    /// Text of each reference of `passage` in the passage's version, in
    /// reference order. `None` marks a reference with no verse stored for
    /// that version. When several verses match, the lowest id wins.
    pub fn passage_verses(&self, passage: &Passage) -> Result<Vec<(Reference, Option<String>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT scripture FROM verses
                 WHERE reference_id = ?1 AND version_id = ?2
                 ORDER BY id LIMIT 1",
            )?;

            let mut refs = passage.references.clone();
            refs.sort_by_key(|r| (r.position(), r.id));

            let mut out = Vec::with_capacity(refs.len());
            for reference in refs {
                let text: Option<String> = stmt
                    .query_row([reference.id, passage.version_id], |row| row.get(0))
                    .optional()?;
                out.push((reference, text));
            }
            Ok(out)
        })
    }
}

fn attach_references(conn: &Connection, passage_id: i64, reference_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO passage_references (passage_id, reference_id) VALUES (?1, ?2)",
    )?;
    for reference_id in reference_ids {
        stmt.execute([passage_id, *reference_id])?;
    }
    Ok(())
}

fn query_version(conn: &Connection, id: i64) -> Result<Option<Version>> {
    let sql = format!("SELECT {} FROM versions WHERE id = ?1", VERSION_COLUMNS);
    conn.query_row(&sql, [id], version_from_row).optional()
}

fn query_verse(conn: &Connection, id: i64) -> Result<Option<Verse>> {
    let sql = format!("{} WHERE vs.id = ?1", VERSE_SELECT);
    conn.query_row(&sql, [id], verse_from_row).optional()
}

fn query_passage(conn: &Connection, id: i64) -> Result<Option<Passage>> {
    let version_id: Option<i64> = conn
        .query_row("SELECT version_id FROM passages WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    let Some(version_id) = version_id else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT r.id, r.chapter, r.verse
         FROM passage_references pr
         JOIN scripture_references r ON r.id = pr.reference_id
         WHERE pr.passage_id = ?1
         ORDER BY r.chapter, r.verse, r.id",
    )?;
    let references = stmt
        .query_map([id], |row| reference_from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(Passage {
        id,
        version_id,
        references,
    }))
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<Version> {
    Ok(Version {
        id: row.get(0)?,
        short_name: row.get(1)?,
        full_name: row.get(2)?,
        publisher_name: row.get(3)?,
        permission_to_quote: row.get(4)?,
        copyright: row.get(5)?,
    })
}

fn reference_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: row.get(offset)?,
        chapter: row.get(offset + 1)?,
        verse: row.get(offset + 2)?,
    })
}

fn verse_from_row(row: &Row<'_>) -> rusqlite::Result<Verse> {
    Ok(Verse {
        id: row.get(0)?,
        reference: reference_from_row(row, 1)?,
        version_id: row.get(4)?,
        version_full_name: row.get(5)?,
        scripture: row.get(6)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proverbs_types::forms::ReferenceForm;

    fn niv_form() -> VersionForm {
        VersionForm {
            short_name: "NIV".into(),
            full_name: "New International Version - 1984".into(),
            publisher_name: "Zondervan".into(),
            permission_to_quote: "Up to 500 verses without written permission.".into(),
            copyright: "Copyright 1973, 1978, 1984 by International Bible Society".into(),
        }
    }

    fn kjv_form() -> VersionForm {
        VersionForm {
            short_name: "KJV".into(),
            full_name: "King James Version".into(),
            publisher_name: "Public domain".into(),
            permission_to_quote: "Public domain.".into(),
            copyright: "None".into(),
        }
    }

    #[test]
    fn versions_list_by_full_name() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();
        let kjv = db.insert_version(&kjv_form()).unwrap();

        let names: Vec<String> = db
            .list_versions()
            .unwrap()
            .into_iter()
            .map(|v| v.full_name)
            .collect();
        assert_eq!(names, vec!["King James Version", "New International Version - 1984"]);

        assert_eq!(db.get_version(niv.id).unwrap(), Some(niv.clone()));
        assert_eq!(
            db.get_version_by_full_name("King James Version").unwrap(),
            Some(kjv)
        );
        assert_eq!(db.get_version_by_full_name("Vulgate").unwrap(), None);
    }

    #[test]
    fn update_and_delete_version() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();

        let mut form = niv_form();
        form.short_name = "NIV84".into();
        let updated = db.update_version(niv.id, &form).unwrap().unwrap();
        assert_eq!(updated.short_name, "NIV84");
        assert!(db.update_version(999, &form).unwrap().is_none());

        assert!(db.delete_version(niv.id).unwrap());
        assert!(!db.delete_version(niv.id).unwrap());
    }

    #[test]
    fn version_in_use_cannot_be_deleted() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();
        let r = db.insert_reference(3, 5).unwrap();
        db.insert_verse(&VerseForm {
            reference_id: r.id,
            version_id: niv.id,
            scripture: "Trust in the Lord with all your heart".into(),
        })
        .unwrap();

        let err = db.delete_version(niv.id).unwrap_err();
        assert!(crate::is_constraint_violation(&err));
    }

    #[test]
    fn references_sort_by_chapter_then_verse() {
        let db = Database::open_in_memory().unwrap();
        for (chapter, verse) in [(4, 1), (3, 12), (3, 2)] {
            let form = ReferenceForm { chapter, verse };
            db.insert_reference(form.chapter, form.verse).unwrap();
        }

        let listed: Vec<String> = db
            .list_references()
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(listed, vec!["3:2", "3:12", "4:1"]);

        let known = db.list_references().unwrap()[0].id;
        assert_eq!(db.missing_references(&[known, 77]).unwrap(), vec![77]);
    }

    #[test]
    fn verses_join_reference_and_version() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();
        let kjv = db.insert_version(&kjv_form()).unwrap();
        let r1 = db.insert_reference(3, 6).unwrap();
        let r2 = db.insert_reference(3, 5).unwrap();

        db.insert_verse(&VerseForm {
            reference_id: r1.id,
            version_id: niv.id,
            scripture: "in all your ways acknowledge him".into(),
        })
        .unwrap();
        let kjv_verse = db
            .insert_verse(&VerseForm {
                reference_id: r2.id,
                version_id: kjv.id,
                scripture: "Trust in the LORD with all thine heart".into(),
            })
            .unwrap();
        assert_eq!(kjv_verse.to_string(), "3:5 (King James Version)");

        let listed: Vec<String> = db.list_verses().unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(
            listed,
            vec!["3:5 (King James Version)", "3:6 (New International Version - 1984)"]
        );

        let moved = db
            .update_verse(
                kjv_verse.id,
                &VerseForm {
                    reference_id: r1.id,
                    version_id: kjv.id,
                    scripture: "In all thy ways acknowledge him".into(),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(moved.reference.id, r1.id);
        assert!(db.delete_verse(moved.id).unwrap());
        assert!(db.get_verse(moved.id).unwrap().is_none());
    }

    #[test]
    fn passages_keep_reference_sets() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();
        let r5 = db.insert_reference(3, 5).unwrap();
        let r6 = db.insert_reference(3, 6).unwrap();
        let r41 = db.insert_reference(4, 1).unwrap();

        let passage = db.insert_passage(niv.id, &[r6.id, r5.id, r6.id]).unwrap();
        assert_eq!(passage.references, vec![r5, r6]);
        assert_eq!(passage.reference(), "3:5 - 6");

        let replaced = db
            .replace_passage(passage.id, niv.id, &[r41.id, r5.id])
            .unwrap()
            .unwrap();
        assert_eq!(replaced.reference(), "3:5 - 4:1");
        assert!(db.replace_passage(999, niv.id, &[r5.id]).unwrap().is_none());

        let single = db.insert_passage(niv.id, &[r41.id]).unwrap();
        let all = db.list_passages().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].reference(), "3:5 - 4:1");
        assert_eq!(all[1], single);

        assert!(db.delete_passage(passage.id).unwrap());
        assert!(db.get_passage(passage.id).unwrap().is_none());
    }

    #[test]
    fn passage_verses_follow_reference_order() {
        let db = Database::open_in_memory().unwrap();
        let niv = db.insert_version(&niv_form()).unwrap();
        let r5 = db.insert_reference(3, 5).unwrap();
        let r6 = db.insert_reference(3, 6).unwrap();
        let r7 = db.insert_reference(3, 7).unwrap();
        for (r, text) in [(r6, "second"), (r5, "first")] {
            db.insert_verse(&VerseForm {
                reference_id: r.id,
                version_id: niv.id,
                scripture: text.into(),
            })
            .unwrap();
        }

        let passage = db.insert_passage(niv.id, &[r7.id, r6.id, r5.id]).unwrap();
        let parts = db.passage_verses(&passage).unwrap();
        assert_eq!(
            parts,
            vec![
                (r5, Some("first".to_string())),
                (r6, Some("second".to_string())),
                (r7, None),
            ]
        );
    }
}
