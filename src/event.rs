//! Note events, the section offset table, and the append-only buffer the VM
//! writes into. Grounded on the teacher's `Track`: a flat, growable list the
//! VM pushes onto and the codec later walks start to finish, plus the same
//! "mutators return false on capacity, not an error" shape spec §6 asks for.

use crate::basis::Basis;
use crate::pitch::{PITCH_MAX, PITCH_MIN};

/// Maximum number of sections a score may declare (spec §4.6).
pub(crate) const MAX_SECTIONS: usize = 65_535;
/// Maximum number of notes a score may hold (spec §3, §4.6).
pub(crate) const MAX_NOTES: usize = 1_048_576;
/// Highest valid articulation index (spec §3, §4.6): `0-9`/`A-Z`/`a-z`.
pub(crate) const MAX_ARTICULATION: u16 = 61;

/// One note, rest-gap, or cue in the score.
///
/// `dur` is positive for a measured note, negative for a grace note (`-1` is
/// nearest the beat, more negative is further before it), and zero for a
/// cue. A cue's `art`/`layer_i` pair encodes the cue number's high/low 16
/// bits rather than an articulation/layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NoteEvent {
    pub t: u32,
    pub dur: i32,
    pub pitch: i16,
    pub art: u16,
    pub sect: u16,
    pub layer_i: u16,
}

/// A compiled (or parsed) score: a basis, a section offset table, and a note
/// list. This is the data value both the VM (writing) and the codec
/// (reading and writing) operate on.
#[derive(Clone, Debug, Default)]
pub struct Score {
    basis: Basis,
    sections: Vec<u32>,
    notes: Vec<NoteEvent>,
}

impl Score {
    /// A fresh score: section 0 at offset 0, no notes, `Q96` basis.
    pub fn new() -> Self {
        Self {
            basis: Basis::default(),
            sections: vec![0],
            notes: Vec::new(),
        }
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn set_basis(&mut self, basis: Basis) {
        self.basis = basis;
    }

    pub fn section_count(&self) -> u16 {
        self.sections.len() as u16
    }

    pub fn note_count(&self) -> u32 {
        self.notes.len() as u32
    }

    pub fn offset(&self, i: usize) -> Option<u32> {
        self.sections.get(i).copied()
    }

    pub fn get_note(&self, i: usize) -> Option<&NoteEvent> {
        self.notes.get(i)
    }

    pub fn set_note(&mut self, i: usize, note: NoteEvent) -> bool {
        self.validate_note(&note);
        match self.notes.get_mut(i) {
            Some(slot) => {
                *slot = note;
                true
            }
            None => false,
        }
    }

    /// Range-checks a note against the invariants spec §3/§6 describe
    /// (pitch range, articulation ceiling, a declared section, and a `t`
    /// that does not precede its section's offset), aborting on violation
    /// rather than silently building a structurally invalid score. This is
    /// a caller-contract check, not an internal fault, so it runs in every
    /// build profile rather than via `debug_assert!`.
    fn validate_note(&self, note: &NoteEvent) {
        assert!(
            (PITCH_MIN..=PITCH_MAX).contains(&note.pitch),
            "pitch {} out of range [{}, {}]",
            note.pitch,
            PITCH_MIN,
            PITCH_MAX
        );
        assert!(
            note.art <= MAX_ARTICULATION,
            "articulation {} exceeds ceiling {}",
            note.art,
            MAX_ARTICULATION
        );
        let offset = self
            .sections
            .get(note.sect as usize)
            .unwrap_or_else(|| panic!("sect {} has no declared section offset", note.sect));
        assert!(
            note.t >= *offset,
            "t {} precedes its section {}'s offset {}",
            note.t,
            note.sect,
            offset
        );
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn sections(&self) -> &[u32] {
        &self.sections
    }

    /// Appends a new section offset. Returns `false` (without mutating) if
    /// the section table is already at capacity. Aborts if `offset`
    /// precedes the previous section's offset — the table is required to
    /// be non-decreasing (spec §4.6) and that is a caller contract, not a
    /// capacity limit.
    pub fn add_section(&mut self, offset: u32) -> bool {
        if let Some(&last) = self.sections.last() {
            assert!(offset >= last, "section offset {} precedes previous offset {}", offset, last);
        }
        if self.sections.len() >= MAX_SECTIONS {
            return false;
        }
        self.sections.push(offset);
        true
    }

    /// Appends a note. Returns `false` (without mutating) if the note list
    /// is already at capacity. Aborts if the note violates spec §3/§6's
    /// range invariants — see [`Score::validate_note`].
    pub fn append_note(&mut self, note: NoteEvent) -> bool {
        self.validate_note(&note);
        if self.notes.len() >= MAX_NOTES {
            return false;
        }
        self.notes.push(note);
        true
    }

    /// Mutable view of the last `n` notes, for the VM's grace-run retrofit
    /// (spec §4.3, §9: "index-based mutation in place").
    pub(crate) fn tail_mut(&mut self, n: usize) -> &mut [NoteEvent] {
        let len = self.notes.len();
        &mut self.notes[len - n..]
    }

    /// Orders notes by `(t, dur)` with grace notes preceding non-grace notes
    /// at the same `t`, per spec §4.5. This is the order both serialisation
    /// and the sort-order-enforcing reader treat as canonical — see spec
    /// §9's note that the source's two sort variants must agree on this one.
    pub fn sort(&mut self) {
        self.notes.sort_by(|a, b| a.t.cmp(&b.t).then(a.dur.cmp(&b.dur)));
    }

    /// `true` if `notes()` is already in the order `sort()` would produce.
    pub(crate) fn is_sorted(&self) -> bool {
        self.notes
            .windows(2)
            .all(|w| (w[0].t, w[0].dur) <= (w[1].t, w[1].dur))
    }
}
