//! Shaping flat join rows into nested note/tag results.

use std::collections::HashMap;

use crate::models::{Note, NoteId, NoteWithTags, Tag};

/// Attach tags to their notes.
///
/// `links` holds one `(note_id, tag)` pair per association row, as returned by
/// a single batched join. Note order is preserved; each note's tags are sorted
/// by name. Links for notes not in `notes` are ignored.
pub fn attach_tags(notes: Vec<Note>, links: Vec<(NoteId, Tag)>) -> Vec<NoteWithTags> {
    let mut by_note: HashMap<NoteId, Vec<Tag>> = HashMap::new();
    for (note_id, tag) in links {
        by_note.entry(note_id).or_default().push(tag);
    }

    notes
        .into_iter()
        .map(|note| {
            let mut tags = by_note.remove(&note.id).unwrap_or_default();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            tags.dedup_by_key(|t| t.id);
            NoteWithTags { note, tags }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(id: NoteId) -> Note {
        Note {
            id,
            title: format!("note {}", id),
            content: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
            color: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_attach_tags_groups_by_note() {
        let shaped = attach_tags(
            vec![note(2), note(1)],
            vec![(1, tag(10, "work")), (2, tag(11, "home")), (1, tag(12, "a"))],
        );

        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].note.id, 2);
        assert_eq!(shaped[0].tag_names(), vec!["home"]);
        assert_eq!(shaped[1].note.id, 1);
        assert_eq!(shaped[1].tag_names(), vec!["a", "work"]);
    }

    #[test]
    fn test_attach_tags_untagged_note_gets_empty_list() {
        let shaped = attach_tags(vec![note(1)], vec![]);
        assert!(shaped[0].tags.is_empty());
    }

    #[test]
    fn test_attach_tags_ignores_links_to_unknown_notes() {
        let shaped = attach_tags(vec![note(1)], vec![(99, tag(10, "orphan"))]);
        assert_eq!(shaped.len(), 1);
        assert!(shaped[0].tags.is_empty());
    }

    #[test]
    fn test_attach_tags_collapses_duplicate_rows() {
        let shaped = attach_tags(vec![note(1)], vec![(1, tag(10, "x")), (1, tag(10, "x"))]);
        assert_eq!(shaped[0].tags.len(), 1);
    }
}
