//! Compiles the Noir ASCII music notation into the binary NMF score format,
//! and reads/writes NMF as a standalone codec.
//!
//! The public surface is small on purpose: [`compile`] runs the whole
//! front-end (lexer -> entity parser -> VM) over a byte stream and hands
//! back a [`Score`]; [`codec::parse`]/[`codec::serialize`] move a `Score` to
//! and from NMF bytes.

#![allow(dead_code)]

#[macro_use]
mod error;
#[macro_use]
mod clamp;
#[macro_use]
mod macros;

mod basis;
/// Read and write NMF files independently of the compiler front-end (spec
/// §4.6, §6: "The codec is also an independent library used for reading
/// existing files.").
pub mod codec;
mod entity;
mod event;
mod lexer;
mod pitch;
mod pitchset;
mod reader;
mod rhythm;
mod token;
mod vm;

use log::trace;
use std::io::Read;

pub use basis::Basis;
pub use error::{Error, Result};
pub use event::{NoteEvent, Score};
pub use pitch::Pitch;
pub use pitchset::PitchSet;

/// Compiles Noir source into a [`Score`].
///
/// Reads the entire stream before producing output (spec §1's
/// "no streaming output" non-goal) and returns the first error encountered,
/// with no partial result.
pub fn compile<R: Read>(source: R) -> Result<Score> {
    trace!("starting compile");
    Ok(entity::compile(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_serialises_a_single_note() {
        let score = compile("5 c".as_bytes()).unwrap();
        let mut buf = Vec::new();
        codec::serialize(&score, &mut buf).unwrap();
        let back = codec::parse(&buf[..]).unwrap();
        assert_eq!(back.notes(), score.notes());
    }

    #[test]
    fn propagates_lexer_errors_with_a_line_number() {
        let err = compile("5 c\n?".as_bytes()).unwrap_err();
        assert_eq!(err.kind_name(), "BadChar");
        assert_eq!(err.line(), Some(2));
    }
}
