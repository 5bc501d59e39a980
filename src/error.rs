//! Error kinds surfaced by the lexer, entity parser, VM and codec.
//!
//! Shape is lifted from the teacher's `error.rs`: a `pub(crate)` enum built
//! with `snafu`, wrapped by a public newtype. The one thing repurposed is the
//! per-variant coordinate: the teacher carries the Rust call site (`site:
//! String`), we carry the Noir source line the offending token was read at
//! (`line: Option<u32>`), since that is what a caller of this compiler needs.

use snafu::Snafu;
use std::fmt;

/// The public error type for this crate.
#[derive(Debug)]
pub struct Error(pub(crate) LibError);

/// The public result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal result type used throughout the crate.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

impl From<LibError> for Error {
    fn from(e: LibError) -> Self {
        Error(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl Error {
    /// The short, stable name of the error kind (`"NoPitch"`, `"Underflow"`, ...).
    pub fn kind_name(&self) -> &'static str {
        self.0.kind_name()
    }

    /// The Noir source line at which the offending token was read, if known.
    pub fn line(&self) -> Option<u32> {
        self.0.line()
    }
}

/// One variant per row of spec §7's Kind table. Every variant carries the
/// line at which the offending token was read (`None` when a line isn't
/// meaningful, e.g. `Empty`, which is only detectable once compilation has
/// finished).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum LibError {
    #[snafu(display("error reading input"))]
    IoRead { line: Option<u32> },

    #[snafu(display("NUL byte in input"))]
    NulChar { line: Option<u32> },

    #[snafu(display("invalid byte or malformed BOM"))]
    BadChar { line: Option<u32> },

    #[snafu(display("line counter overflow"))]
    OverLine { line: Option<u32> },

    #[snafu(display("malformed key operator"))]
    KeyToken { line: Option<u32> },

    #[snafu(display("malformed parameter operator"))]
    ParamTk { line: Option<u32> },

    #[snafu(display("token too long"))]
    LongToken { line: Option<u32> },

    #[snafu(display("unmatched closing bracket"))]
    Right { line: Option<u32> },

    #[snafu(display("unclosed pitch group"))]
    Unclosed { line: Option<u32> },

    #[snafu(display("group nesting too deep"))]
    TooDeep { line: Option<u32> },

    #[snafu(display("grace component inside a rhythm group"))]
    InGrace { line: Option<u32> },

    #[snafu(display("duration overflow"))]
    LongDur { line: Option<u32> },

    #[snafu(display("invalid duration"))]
    BadDur { line: Option<u32> },

    #[snafu(display("invalid pitch letter"))]
    BadPitch { line: Option<u32> },

    #[snafu(display("pitch out of range"))]
    PitchR { line: Option<u32> },

    #[snafu(display("transposed pitch out of range"))]
    TransRng { line: Option<u32> },

    #[snafu(display("invalid operator parameter"))]
    BadOp { line: Option<u32> },

    #[snafu(display("invalid repeat count"))]
    MultCount { line: Option<u32> },

    #[snafu(display("invalid layer number"))]
    BadLayer { line: Option<u32> },

    #[snafu(display("stack underflow"))]
    Underflow { line: Option<u32> },

    #[snafu(display("stack full"))]
    StackFull { line: Option<u32> },

    #[snafu(display("stacks not empty at section boundary"))]
    Linger { line: Option<u32> },

    #[snafu(display("one-shot articulation not consumed"))]
    DangleArt { line: Option<u32> },

    #[snafu(display("no bookmarked location"))]
    NoLoc { line: Option<u32> },

    #[snafu(display("no pitch set in effect"))]
    NoPitch { line: Option<u32> },

    #[snafu(display("no duration in effect"))]
    NoDur { line: Option<u32> },

    #[snafu(display("cumulative transposition overflow"))]
    HugeTrans { line: Option<u32> },

    #[snafu(display("grace run overflow"))]
    HugeGrace { line: Option<u32> },

    #[snafu(display("cursor overflow"))]
    LongPiece { line: Option<u32> },

    #[snafu(display("too many sections"))]
    ManySect { line: Option<u32> },

    #[snafu(display("too many notes"))]
    ManyNotes { line: Option<u32> },

    #[snafu(display("cue number out of range"))]
    CueNum { line: Option<u32> },

    #[snafu(display("compilation yielded zero notes"))]
    Empty,

    /// Not one of spec §7's Kinds: the Kind table is scoped to the Noir
    /// front-end, but §4.6's codec reader needs its own validation failure
    /// (bad signature, an out-of-range field, sections/notes out of order).
    /// Reusing this one `Error` type keeps the codec and compiler on a
    /// single error surface instead of forking a second one.
    #[snafu(display("malformed NMF file"))]
    BadFile,

    /// Likewise absent from §7's Kind table: a write-side I/O failure on the
    /// codec's output stream.
    #[snafu(display("error writing output"))]
    IoWrite,
}

impl LibError {
    pub(crate) fn kind_name(&self) -> &'static str {
        use LibError::*;
        match self {
            IoRead { .. } => "IoRead",
            NulChar { .. } => "NulChar",
            BadChar { .. } => "BadChar",
            OverLine { .. } => "OverLine",
            KeyToken { .. } => "KeyToken",
            ParamTk { .. } => "ParamTk",
            LongToken { .. } => "LongToken",
            Right { .. } => "Right",
            Unclosed { .. } => "Unclosed",
            TooDeep { .. } => "TooDeep",
            InGrace { .. } => "InGrace",
            LongDur { .. } => "LongDur",
            BadDur { .. } => "BadDur",
            BadPitch { .. } => "BadPitch",
            PitchR { .. } => "PitchR",
            TransRng { .. } => "TransRng",
            BadOp { .. } => "BadOp",
            MultCount { .. } => "MultCount",
            BadLayer { .. } => "BadLayer",
            Underflow { .. } => "Underflow",
            StackFull { .. } => "StackFull",
            Linger { .. } => "Linger",
            DangleArt { .. } => "DangleArt",
            NoLoc { .. } => "NoLoc",
            NoPitch { .. } => "NoPitch",
            NoDur { .. } => "NoDur",
            HugeTrans { .. } => "HugeTrans",
            HugeGrace { .. } => "HugeGrace",
            LongPiece { .. } => "LongPiece",
            ManySect { .. } => "ManySect",
            ManyNotes { .. } => "ManyNotes",
            CueNum { .. } => "CueNum",
            Empty => "Empty",
            BadFile => "BadFile",
            IoWrite => "IoWrite",
        }
    }

    pub(crate) fn line(&self) -> Option<u32> {
        use LibError::*;
        match self {
            IoRead { line }
            | NulChar { line }
            | BadChar { line }
            | OverLine { line }
            | KeyToken { line }
            | ParamTk { line }
            | LongToken { line }
            | Right { line }
            | Unclosed { line }
            | TooDeep { line }
            | InGrace { line }
            | LongDur { line }
            | BadDur { line }
            | BadPitch { line }
            | PitchR { line }
            | TransRng { line }
            | BadOp { line }
            | MultCount { line }
            | BadLayer { line }
            | Underflow { line }
            | StackFull { line }
            | Linger { line }
            | DangleArt { line }
            | NoLoc { line }
            | NoPitch { line }
            | NoDur { line }
            | HugeTrans { line }
            | HugeGrace { line }
            | LongPiece { line }
            | ManySect { line }
            | ManyNotes { line }
            | CueNum { line } => *line,
            Empty | BadFile | IoWrite => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_and_line_round_trip() {
        let e: Error = LibError::NoPitch { line: Some(7) }.into();
        assert_eq!(e.kind_name(), "NoPitch");
        assert_eq!(e.line(), Some(7));
        assert!(format!("{}", e).contains("no pitch"));
    }

    #[test]
    fn empty_has_no_line() {
        let e: Error = LibError::Empty.into();
        assert_eq!(e.kind_name(), "Empty");
        assert_eq!(e.line(), None);
    }
}
