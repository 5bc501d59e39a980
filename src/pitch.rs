//! Single-pitch decode: letter + accidentals + registers -> a signed
//! semitone offset from middle C, per spec §4.2's table.

use crate::error::{self, LibResult};

pub(crate) const PITCH_MIN: i16 = -39;
pub(crate) const PITCH_MAX: i16 = 48;

/// A signed semitone offset from middle C, always in `[-39, +48]`.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Pitch(i16);

impl Pitch {
    pub(crate) fn new(value: i32, line: Option<u32>) -> LibResult<Self> {
        if value < PITCH_MIN as i32 || value > PITCH_MAX as i32 {
            return error::PitchR { line }.fail();
        }
        Ok(Self(value as i16))
    }

    /// Builds a pitch already known to be in range (e.g. reconstructed from
    /// a bitmap index, or after a transpose bounds-check has already run).
    pub(crate) fn new_unchecked(value: i16) -> Self {
        debug_assert!((PITCH_MIN..=PITCH_MAX).contains(&value));
        Self(value)
    }

    pub fn get(&self) -> i16 {
        self.0
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Decodes one pitch token (`"cs'"`, `"Bh,"`, ...) into a semitone offset.
/// `text` is the lexer's already-validated pitch token (first char is a
/// pitch letter; subsequent chars are accidentals/registers).
pub(crate) fn decode_pitch(text: &str, line: u32) -> LibResult<Pitch> {
    let mut chars = text.chars();
    let first = chars.next().expect("pitch token is never empty");
    let mut value: i32 = match first {
        'C' => -12,
        'c' => 0,
        'D' => -10,
        'd' => 2,
        'E' => -8,
        'e' => 4,
        'F' => -7,
        'f' => 5,
        'G' => -5,
        'g' => 7,
        'A' => -3,
        'a' => 9,
        'B' => -1,
        'b' => 11,
        _ => return error::BadPitch { line: Some(line) }.fail(),
    };
    for c in chars {
        value += match c {
            'x' | 'X' => 2,
            's' | 'S' => 1,
            'n' | 'N' => 0,
            'h' | 'H' => -1,
            't' | 'T' => -2,
            '\'' => 12,
            ',' => -12,
            _ => return error::BadPitch { line: Some(line) }.fail(),
        };
    }
    Pitch::new(value, Some(line))
}
