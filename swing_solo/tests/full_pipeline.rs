// End-to-end tests: corpus directory in, generated MIDI file out.
//
// Each test writes a small synthetic corpus of format-1 MIDI files (a tempo
// track followed by a melody track) into a temporary directory, runs a
// generation request against it, and inspects the file that comes out by
// decoding it again.

use std::path::Path;

use midly::num::{u4, u7, u15, u24, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use swing_solo::config::GeneratorConfig;
use swing_solo::decode::{decode, decode_file};
use swing_solo::key::{Key, ScaleType, transpose};
use swing_solo::session::{GenerationRequest, run};
use swing_solo::{Pitch, SoloError};

const TPB: u16 = 96;

/// (MIDI key, length in ticks, silence after in ticks)
type Phrase = [(u8, u32, u32)];

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note(key: u8, on: bool) -> TrackEventKind<'static> {
    let message = if on {
        MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(90),
        }
    } else {
        MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(0),
        }
    };
    TrackEventKind::Midi {
        channel: u4::new(0),
        message,
    }
}

fn write_performance(dir: &Path, name: &str, bpm: u32, phrase: &Phrase) {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(TPB))));
    smf.tracks.push(vec![
        event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / bpm)))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);

    let mut melody = Vec::new();
    let mut pending_gap = 0;
    for &(key, length, gap) in phrase {
        melody.push(event(pending_gap, note(key, true)));
        melody.push(event(length, note(key, false)));
        pending_gap = gap;
    }
    melody.push(event(pending_gap, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    smf.tracks.push(melody);

    smf.save(dir.join(name)).unwrap();
}

/// A swung phrase in C major: eighths, a triplet figure and a rest.
fn c_major_phrase(transpose_by: u8) -> Vec<(u8, u32, u32)> {
    [
        (60, 48, 0),
        (62, 48, 0),
        (64, 32, 0),
        (65, 32, 0),
        (67, 32, 48),
        (69, 96, 0),
        (67, 24, 0),
        (64, 72, 0),
    ]
    .iter()
    .map(|&(k, len, gap)| (k + transpose_by, len, gap))
    .collect()
}

fn corpus_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_performance(dir.path(), "Blues_C_major.mid", 120, &c_major_phrase(0));
    write_performance(dir.path(), "Ballad_Eb_major.mid", 90, &c_major_phrase(3));
    write_performance(dir.path(), "Bebop_bb_major.mid", 200, &c_major_phrase(10));
    write_performance(dir.path(), "Lament_A_minor.mid", 100, &c_major_phrase(0));
    dir
}

fn config_for(corpus: &Path, output: &Path) -> GeneratorConfig {
    GeneratorConfig {
        corpus_dir: corpus.to_path_buf(),
        output_dir: output.to_path_buf(),
        ..GeneratorConfig::default()
    }
}

#[test]
fn test_generate_writes_solo_in_requested_key() {
    let corpus = corpus_dir();
    let out = tempfile::tempdir().unwrap();
    let config = config_for(corpus.path(), &out.path().join("midi_creations"));
    let request = GenerationRequest {
        key: "D".into(),
        tempo_bpm: 140,
        scale: ScaleType::Major,
        bars: 2,
    };

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let report = run(&request, &config, &mut rng).unwrap();

    assert_eq!(report.corpus_files, 3);
    assert_eq!(report.generated_symbols, 64);
    assert!(report.output_path.ends_with("midi_creations/D_major_140_2.mid"));
    assert!(report.output_path.exists());

    // Every corpus note is in C major once normalized, so every generated
    // note must be in D major.
    let d_major = [2, 4, 6, 7, 9, 11, 1];
    let c_major = Key::new("C", ScaleType::Major).unwrap();
    let written = decode_file(&report.output_path, Some(&c_major)).unwrap();
    assert!(!written.is_empty());
    for symbol in &written {
        match symbol.pitch {
            Pitch::Class(pc) => assert!(d_major.contains(&pc), "{symbol} not in D major"),
            Pitch::Rest => panic!("encoder never writes gaps"),
        }
    }
}

#[test]
fn test_same_seed_same_bytes() {
    let corpus = corpus_dir();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        key: "F#".into(),
        tempo_bpm: 180,
        scale: ScaleType::Major,
        bars: 4,
    };

    let a = run(
        &request,
        &config_for(corpus.path(), out_a.path()),
        &mut ChaCha8Rng::seed_from_u64(8),
    )
    .unwrap();
    let b = run(
        &request,
        &config_for(corpus.path(), out_b.path()),
        &mut ChaCha8Rng::seed_from_u64(8),
    )
    .unwrap();

    assert_eq!(
        std::fs::read(&a.output_path).unwrap(),
        std::fs::read(&b.output_path).unwrap()
    );
}

#[test]
fn test_decode_then_transpose_restores_source_pitches() {
    let dir = tempfile::tempdir().unwrap();
    let phrase = c_major_phrase(3);
    write_performance(dir.path(), "Ballad_Eb_major.mid", 90, &phrase);

    let path = dir.path().join("Ballad_Eb_major.mid");
    let normalized = decode_file(&path, None).unwrap();
    let restored = transpose(&normalized, "Eb").unwrap();

    let pitches: Vec<Pitch> = restored.iter().map(|s| s.pitch).filter(|p| !p.is_rest()).collect();
    let expected: Vec<Pitch> = phrase.iter().map(|&(k, _, _)| Pitch::from_semitone(k as i32)).collect();
    assert_eq!(pitches, expected);

    // The gap after the fifth note is an eighth at any tempo.
    assert_eq!(restored.iter().filter(|s| s.pitch.is_rest()).count(), 1);
}

#[test]
fn test_minor_round_trip_through_relative_major_reference() {
    let dir = tempfile::tempdir().unwrap();
    // D minor material.
    let phrase: Vec<(u8, u32, u32)> = [(62, 48, 0), (65, 48, 0), (69, 48, 0), (61, 48, 0)].to_vec();
    write_performance(dir.path(), "Nardis_D_minor.mid", 120, &phrase);

    let bytes = std::fs::read(dir.path().join("Nardis_D_minor.mid")).unwrap();
    let key = Key::new("D", ScaleType::Minor).unwrap();
    let normalized = decode(&bytes, &key).unwrap();
    // D minor lands on A minor: D -> A.
    assert_eq!(normalized[0].pitch, Pitch::Class(9));

    let restored = transpose(&normalized, "D minor").unwrap();
    let pitches: Vec<Pitch> = restored.iter().map(|s| s.pitch).collect();
    let expected: Vec<Pitch> = phrase.iter().map(|&(k, _, _)| Pitch::from_semitone(k as i32)).collect();
    assert_eq!(pitches, expected);
}

#[test]
fn test_bad_training_file_fails_whole_request() {
    let corpus = corpus_dir();
    std::fs::write(corpus.path().join("Broken_G_major.mid"), b"MThd nope").unwrap();
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        key: "C".into(),
        tempo_bpm: 120,
        scale: ScaleType::Major,
        bars: 1,
    };

    let err = run(
        &request,
        &config_for(corpus.path(), out.path()),
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, SoloError::CorpusFile { .. }));
    assert!(err.to_string().contains("Broken_G_major.mid"));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_unkeyed_training_file_is_key_resolution_error() {
    let corpus = corpus_dir();
    write_performance(corpus.path(), "jam_session_major.mid", 120, &c_major_phrase(0));
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        key: "C".into(),
        tempo_bpm: 120,
        scale: ScaleType::Major,
        bars: 1,
    };

    let err = run(
        &request,
        &config_for(corpus.path(), out.path()),
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    match err {
        SoloError::CorpusFile { source, .. } => {
            assert!(matches!(*source, SoloError::KeyResolution(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_minor_request_without_minor_files() {
    let dir = tempfile::tempdir().unwrap();
    write_performance(dir.path(), "Blues_C_major.mid", 120, &c_major_phrase(0));
    let out = tempfile::tempdir().unwrap();
    let request = GenerationRequest {
        key: "C".into(),
        tempo_bpm: 120,
        scale: ScaleType::Minor,
        bars: 1,
    };

    let err = run(
        &request,
        &config_for(dir.path(), out.path()),
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, SoloError::EmptyCorpus { .. }));
}
