//! Compiles a short Noir fragment (quarter-note C major arpeggio, then a
//! new section holding the triad as a chord) and writes the resulting NMF
//! to stdout, so the output can be piped straight into any downstream NMF
//! tool.

const ARPEGGIO_THEN_CHORD: &str = r#"
# quarter notes (rhythm digit 5 = 96 quanta at Q96) through a C major triad
5 c 5 e 5 g
$
5 (ceg)
"#;

fn main() {
    let score = nmfc::compile(ARPEGGIO_THEN_CHORD.as_bytes()).expect("demo source should compile");
    eprintln!("compiled {} note(s) across {} section(s)", score.note_count(), score.section_count());
    let stdout = std::io::stdout();
    nmfc::codec::serialize(&score, stdout.lock()).expect("a non-empty score always serialises");
}
