mod utils;

use utils::enable_logging;

fn compile(src: &str) -> nmfc::Score {
    nmfc::compile(src.as_bytes()).unwrap()
}

fn tuples(score: &nmfc::Score) -> Vec<(u32, i32, i16, u16, u16, u16)> {
    score.notes().iter().map(|n| (n.t, n.dur, n.pitch, n.art, n.sect, n.layer_i)).collect()
}

/// Serialises and re-parses `score`, and asserts the round trip matches
/// modulo sort order (spec §8, scenario closing line).
fn assert_round_trips(score: &nmfc::Score) {
    let mut buf = Vec::new();
    nmfc::codec::serialize(score, &mut buf).unwrap();
    let mut back = nmfc::codec::parse(&buf[..]).unwrap();
    let mut expected = score.clone();
    back.sort();
    expected.sort();
    assert_eq!(back.notes(), expected.notes());
    assert_eq!(back.sections(), expected.sections());
}

#[test]
fn single_note() {
    enable_logging();
    let score = compile("5 c");
    assert_eq!(tuples(&score), vec![(0, 96, 0, 0, 0, 0)]);
    assert_eq!(score.sections(), &[0]);
    assert_round_trips(&score);
}

#[test]
fn chord() {
    enable_logging();
    let score = compile("5 (ceg)");
    assert_eq!(
        tuples(&score),
        vec![(0, 96, 0, 0, 0, 0), (0, 96, 4, 0, 0, 0), (0, 96, 7, 0, 0, 0)]
    );
    assert_round_trips(&score);
}

#[test]
fn grace_run_then_beat() {
    enable_logging();
    let score = compile("0 cde 5 f");
    assert_eq!(
        tuples(&score),
        vec![
            (0, -3, 0, 0, 0, 0),
            (0, -2, 2, 0, 0, 0),
            (0, -1, 4, 0, 0, 0),
            (0, 96, 5, 0, 0, 0),
        ]
    );
    assert_round_trips(&score);
}

#[test]
fn section_change() {
    enable_logging();
    let score = compile("5 c $ 5 d");
    assert_eq!(score.sections(), &[0, 96]);
    assert_eq!(
        tuples(&score),
        vec![(0, 96, 0, 0, 0, 0), (96, 96, 2, 0, 1, 0)]
    );
    assert_round_trips(&score);
}

#[test]
fn transposition() {
    enable_logging();
    let score = compile("^2; 5 c =");
    assert_eq!(tuples(&score), vec![(0, 96, 2, 0, 0, 0)]);
    assert_round_trips(&score);
}

#[test]
fn cue() {
    enable_logging();
    let score = compile("5 c `0;");
    let notes = tuples(&score);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0], (0, 96, 0, 0, 0, 0));
    let (t, dur, pitch, art, sect, layer_i) = notes[1];
    assert_eq!((t, dur, pitch, art, sect, layer_i), (0, 0, 0, 0, 0, 0));
    assert_round_trips(&score);
}

#[test]
fn repeat_operator_replays_last_pitch_and_duration() {
    enable_logging();
    let score = compile("5 c / /");
    assert_eq!(score.notes().len(), 3);
    assert!(score.notes().iter().all(|n| n.t % 96 == 0));
}

#[test]
fn multiplied_repeat_runs_n_times() {
    enable_logging();
    let score = compile("5 c \\3;");
    assert_eq!(score.notes().len(), 4);
    let ts: Vec<u32> = score.notes().iter().map(|n| n.t).collect();
    assert_eq!(ts, vec![0, 96, 192, 288]);
}

#[test]
fn layer_and_articulation_operators() {
    enable_logging();
    let score = compile("!5 5 c +3; 5 d -~");
    assert_eq!(score.notes()[0].art, 5);
    assert_eq!(score.notes()[1].layer_i, 2);
}

#[test]
fn unmatched_closing_paren_is_right_error() {
    enable_logging();
    let err = nmfc::compile("5 c)".as_bytes()).unwrap_err();
    assert_eq!(err.kind_name(), "Right");
    assert_eq!(err.line(), Some(1));
}

#[test]
fn malformed_bom_is_rejected() {
    enable_logging();
    let bad = [0xEFu8, 0x00, 0x00];
    let err = nmfc::compile(&bad[..]).unwrap_err();
    assert_eq!(err.kind_name(), "BadChar");
}

#[test]
fn nul_byte_is_rejected() {
    enable_logging();
    let err = nmfc::compile(&b"5 c\0"[..]).unwrap_err();
    assert_eq!(err.kind_name(), "NulChar");
}
