//! The NMF binary codec: read and write, with the range checks and biased
//! integer encoding spec §4.6 describes. Grounded on the teacher's
//! `byte_iter.rs` big-endian `read_u16`/`read_u32` pair, generalised to the
//! write side too since this format has no variable-length fields to need a
//! running-status `Scribe`.

use crate::basis::Basis;
use crate::error::{self, LibResult, Result};
use crate::event::{NoteEvent, Score, MAX_NOTES};
use crate::pitch::{PITCH_MAX, PITCH_MIN};
use std::io::{Read, Write};

const PRIMARY_SIGNATURE: u32 = 1_928_196_216;
const SECONDARY_SIGNATURE: u32 = 1_313_818_926;
const MAX_ART: u16 = 61;

fn read_u16<R: Read>(r: &mut R) -> LibResult<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf).map_err(|_| ()).or_else(|_| error::IoRead { line: None }.fail())?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> LibResult<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(|_| ()).or_else(|_| error::IoRead { line: None }.fail())?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads a `uint32` field (spec §4.6: "4 bytes, MSB zero -> range
/// `[0, 2^31-1]` (top bit reserved)"), rejecting a raw value with the top
/// bit set. Used for quanta-count fields (`t`, section offsets); the
/// signature and note-count fields are checked against their own explicit
/// bounds instead, which are already far below `2^31`.
fn read_quanta32<R: Read>(r: &mut R) -> LibResult<u32> {
    let raw = read_u32(r)?;
    if raw & 0x8000_0000 != 0 {
        return error::BadFile.fail();
    }
    Ok(raw)
}

fn write_u16<W: Write>(w: &mut W, v: u16) -> LibResult<()> {
    w.write_all(&v.to_be_bytes()).map_err(|_| ()).or_else(|_| error::IoWrite.fail())
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> LibResult<()> {
    w.write_all(&v.to_be_bytes()).map_err(|_| ()).or_else(|_| error::IoWrite.fail())
}

fn encode_bias32(value: i32) -> u32 {
    (value as i64 + (1i64 << 31)) as u32
}

fn decode_bias32(raw: u32) -> LibResult<i32> {
    if raw == 0 {
        return error::BadFile.fail();
    }
    Ok((raw as i64 - (1i64 << 31)) as i32)
}

fn encode_bias16(value: i16) -> u16 {
    (value as i32 + 32_768) as u16
}

fn decode_bias16(raw: u16) -> LibResult<i16> {
    if raw == 0 {
        return error::BadFile.fail();
    }
    Ok((raw as i32 - 32_768) as i16)
}

fn read_note<R: Read>(r: &mut R, section_count: u16, offsets: &[u32]) -> LibResult<NoteEvent> {
    let t = read_quanta32(r)?;
    let dur = decode_bias32(read_u32(r)?)?;
    let pitch = decode_bias16(read_u16(r)?)?;
    let art = read_u16(r)?;
    let sect = read_u16(r)?;
    let layer_i = read_u16(r)?;

    if pitch < PITCH_MIN || pitch > PITCH_MAX {
        return error::BadFile.fail();
    }
    if art > MAX_ART {
        return error::BadFile.fail();
    }
    if sect >= section_count {
        return error::BadFile.fail();
    }
    if t < offsets[sect as usize] {
        return error::BadFile.fail();
    }
    Ok(NoteEvent { t, dur, pitch, art, sect, layer_i })
}

fn parse_inner<R: Read>(r: &mut R, enforce_sort: bool) -> LibResult<Score> {
    if read_u32(r)? != PRIMARY_SIGNATURE {
        return error::BadFile.fail();
    }
    if read_u32(r)? != SECONDARY_SIGNATURE {
        return error::BadFile.fail();
    }
    let basis = Basis::from_code(read_u16(r)?)?;
    let section_count = read_u16(r)?;
    if section_count == 0 {
        return error::BadFile.fail();
    }
    let note_count = read_u32(r)?;
    if note_count == 0 || note_count as usize > MAX_NOTES {
        return error::BadFile.fail();
    }

    let mut offsets = Vec::with_capacity(section_count as usize);
    for i in 0..section_count {
        let offset = read_quanta32(r)?;
        if i == 0 && offset != 0 {
            return error::BadFile.fail();
        }
        if let Some(&prev) = offsets.last() {
            if offset < prev {
                return error::BadFile.fail();
            }
        }
        offsets.push(offset);
    }

    let mut score = Score::new();
    score.set_basis(basis);
    for (i, &offset) in offsets.iter().enumerate() {
        if i == 0 {
            continue; // Score::new() already seeds section 0 at offset 0.
        }
        if !score.add_section(offset) {
            return error::BadFile.fail();
        }
    }

    for _ in 0..note_count {
        let note = read_note(r, section_count, &offsets)?;
        if !score.append_note(note) {
            return error::BadFile.fail();
        }
    }

    if enforce_sort && !score.is_sorted() {
        return error::BadFile.fail();
    }
    Ok(score)
}

/// Parses an NMF file. Does not require the notes to already be sorted.
pub fn parse<R: Read>(mut r: R) -> Result<Score> {
    Ok(parse_inner(&mut r, false)?)
}

/// As [`parse`], but additionally rejects files whose notes are not in the
/// `(t, dur)` order spec §4.5 describes.
pub fn parse_sorted<R: Read>(mut r: R) -> Result<Score> {
    Ok(parse_inner(&mut r, true)?)
}

fn serialize_inner<W: Write>(score: &Score, w: &mut W) -> LibResult<()> {
    if score.note_count() == 0 {
        return error::Empty.fail();
    }
    write_u32(w, PRIMARY_SIGNATURE)?;
    write_u32(w, SECONDARY_SIGNATURE)?;
    write_u16(w, score.basis().code())?;
    write_u16(w, score.section_count())?;
    write_u32(w, score.note_count())?;
    for &offset in score.sections() {
        write_u32(w, offset)?;
    }
    for note in score.notes() {
        write_u32(w, note.t)?;
        write_u32(w, encode_bias32(note.dur))?;
        write_u16(w, encode_bias16(note.pitch))?;
        write_u16(w, note.art)?;
        write_u16(w, note.sect)?;
        write_u16(w, note.layer_i)?;
    }
    Ok(())
}

/// Serialises a score as an NMF file. Fails with `Empty` if the score has no
/// notes.
pub fn serialize<W: Write>(score: &Score, mut w: W) -> Result<()> {
    Ok(serialize_inner(score, &mut w)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NoteEvent;

    fn sample_score() -> Score {
        let mut s = Score::new();
        s.append_note(NoteEvent { t: 0, dur: 96, pitch: 0, art: 0, sect: 0, layer_i: 0 });
        s.append_note(NoteEvent { t: 96, dur: 96, pitch: 2, art: 0, sect: 0, layer_i: 0 });
        s
    }

    #[test]
    fn bias_round_trips_extremes() {
        assert_eq!(decode_bias32(encode_bias32(i32::MIN + 1)).unwrap(), i32::MIN + 1);
        assert_eq!(decode_bias32(encode_bias32(i32::MAX)).unwrap(), i32::MAX);
        assert_eq!(decode_bias16(encode_bias16(-32767)).unwrap(), -32767);
        assert_eq!(decode_bias16(encode_bias16(32767)).unwrap(), 32767);
    }

    #[test]
    fn bias_raw_zero_is_reserved() {
        assert!(decode_bias32(0).is_err());
        assert!(decode_bias16(0).is_err());
    }

    #[test]
    fn round_trip_through_bytes() {
        let score = sample_score();
        let mut buf = Vec::new();
        serialize(&score, &mut buf).unwrap();
        let back = parse(&buf[..]).unwrap();
        assert_eq!(back.notes(), score.notes());
        assert_eq!(back.sections(), score.sections());
        assert_eq!(back.basis(), score.basis());
    }

    #[test]
    fn serialize_rejects_empty_score() {
        let score = Score::new();
        let mut buf = Vec::new();
        let err = serialize(&score, &mut buf).unwrap_err();
        assert_eq!(err.kind_name(), "Empty");
    }

    #[test]
    fn parse_rejects_bad_signature() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&[0, 0, 0, 0]);
        let err = parse(&buf[..]).unwrap_err();
        assert_eq!(err.kind_name(), "BadFile");
    }

    #[test]
    fn parse_sorted_rejects_out_of_order_notes() {
        let mut score = Score::new();
        score.append_note(NoteEvent { t: 96, dur: 1, pitch: 0, art: 0, sect: 0, layer_i: 0 });
        score.append_note(NoteEvent { t: 0, dur: 1, pitch: 0, art: 0, sect: 0, layer_i: 0 });
        let mut buf = Vec::new();
        serialize(&score, &mut buf).unwrap();
        assert!(parse(&buf[..]).is_ok());
        let err = parse_sorted(&buf[..]).unwrap_err();
        assert_eq!(err.kind_name(), "BadFile");
    }

    /// A note whose `t` precedes its own section's declared offset can
    /// never be built through [`Score`]'s public API (it aborts on
    /// construction, per spec §3/§6), but a hostile byte stream can still
    /// claim one. Hand-assemble the bytes to check the reader itself
    /// rejects it rather than relying on in-memory construction.
    #[test]
    fn parse_rejects_note_before_its_sections_offset() {
        let mut buf = Vec::new();
        write_u32(&mut buf, PRIMARY_SIGNATURE).unwrap();
        write_u32(&mut buf, SECONDARY_SIGNATURE).unwrap();
        write_u16(&mut buf, 0).unwrap(); // basis: Q96
        write_u16(&mut buf, 2).unwrap(); // section_count
        write_u32(&mut buf, 1).unwrap(); // note_count
        write_u32(&mut buf, 0).unwrap(); // section 0 offset
        write_u32(&mut buf, 100).unwrap(); // section 1 offset
        write_u32(&mut buf, 50).unwrap(); // note.t, precedes offset 100
        write_u32(&mut buf, encode_bias32(1)).unwrap();
        write_u16(&mut buf, encode_bias16(0)).unwrap();
        write_u16(&mut buf, 0).unwrap(); // art
        write_u16(&mut buf, 1).unwrap(); // sect
        write_u16(&mut buf, 0).unwrap(); // layer_i

        let err = parse(&buf[..]).unwrap_err();
        assert_eq!(err.kind_name(), "BadFile");
    }

    /// `t` and section offsets are `uint32` (spec §4.6: MSB zero, range
    /// `[0, 2^31-1]`). A raw value with the top bit set must be rejected at
    /// read time even though it fits in a Rust `u32`.
    #[test]
    fn parse_rejects_top_bit_set_on_t_and_offsets() {
        let mut buf = Vec::new();
        write_u32(&mut buf, PRIMARY_SIGNATURE).unwrap();
        write_u32(&mut buf, SECONDARY_SIGNATURE).unwrap();
        write_u16(&mut buf, 0).unwrap(); // basis: Q96
        write_u16(&mut buf, 1).unwrap(); // section_count
        write_u32(&mut buf, 1).unwrap(); // note_count
        write_u32(&mut buf, 0).unwrap(); // section 0 offset
        write_u32(&mut buf, 0x8000_0000).unwrap(); // note.t, top bit set
        write_u32(&mut buf, encode_bias32(1)).unwrap();
        write_u16(&mut buf, encode_bias16(0)).unwrap();
        write_u16(&mut buf, 0).unwrap(); // art
        write_u16(&mut buf, 0).unwrap(); // sect
        write_u16(&mut buf, 0).unwrap(); // layer_i

        let err = parse(&buf[..]).unwrap_err();
        assert_eq!(err.kind_name(), "BadFile");

        let mut buf = Vec::new();
        write_u32(&mut buf, PRIMARY_SIGNATURE).unwrap();
        write_u32(&mut buf, SECONDARY_SIGNATURE).unwrap();
        write_u16(&mut buf, 0).unwrap(); // basis: Q96
        write_u16(&mut buf, 2).unwrap(); // section_count
        write_u32(&mut buf, 1).unwrap(); // note_count
        write_u32(&mut buf, 0).unwrap(); // section 0 offset
        write_u32(&mut buf, u32::MAX).unwrap(); // section 1 offset, top bit set
        write_u32(&mut buf, 0).unwrap(); // note.t
        write_u32(&mut buf, encode_bias32(1)).unwrap();
        write_u16(&mut buf, encode_bias16(0)).unwrap();
        write_u16(&mut buf, 0).unwrap(); // art
        write_u16(&mut buf, 0).unwrap(); // sect
        write_u16(&mut buf, 0).unwrap(); // layer_i

        let err = parse(&buf[..]).unwrap_err();
        assert_eq!(err.kind_name(), "BadFile");
    }
}
