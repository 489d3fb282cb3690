// MIDI output from generated symbol sequences.
//
// Converts a list of symbols into a single-track Standard MIDI File: one
// tempo event and a piano program change at time zero, then a note-on /
// note-off pair per pitched symbol. Rests emit nothing, so silences in the
// training material are not reproduced in the output; only pitch content
// and note lengths are.
//
// Pitch classes are placed in the octave starting at `EncodeOptions::base_note`.
// Uses the `midly` crate for MIDI writing.

use crate::error::{Result, SoloError};
use crate::symbol::{Beats, Pitch, Symbol};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Largest microseconds-per-beat a tempo event can hold (24 bits).
const MAX_TEMPO_MICROS: u32 = (1 << 24) - 1;

/// Largest delta-time an event can hold (28 bits).
const MAX_DELTA_TICKS: u32 = (1 << 28) - 1;

/// Settings that shape the written file but not the melody.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    pub ticks_per_beat: u16,
    /// MIDI note for pitch class 0.
    pub base_note: u8,
    pub velocity: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            ticks_per_beat: TICKS_PER_QUARTER,
            base_note: 60,
            velocity: 100,
        }
    }
}

/// Tick length of a quantized duration. Whole multiples of a third of a
/// beat are computed on the triplet grid, everything else on the straight
/// grid; both truncate.
pub fn duration_ticks(duration: Beats, ticks_per_beat: u16) -> u32 {
    let beats = duration.as_f64();
    let tpb = ticks_per_beat as f64;
    let ticks = if duration.is_third_multiple() {
        (beats / (1.0 / 3.0)) * (tpb / 3.0)
    } else {
        beats * tpb
    };
    ticks as u32
}

/// Microseconds per beat for the tempo event of a `tempo_bpm` file.
/// Tempos from 4 to 60,000,000 BPM are representable.
pub fn tempo_micros(tempo_bpm: u32) -> Result<u32> {
    if tempo_bpm == 0 {
        return Err(SoloError::InvalidParameter("tempo must be a positive integer".into()));
    }
    let micros = 60_000_000 / tempo_bpm;
    if micros == 0 || micros > MAX_TEMPO_MICROS {
        return Err(SoloError::InvalidParameter(format!(
            "tempo {tempo_bpm} BPM does not fit a MIDI tempo event"
        )));
    }
    Ok(micros)
}

fn midi_event(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message,
        },
    }
}

/// Build an in-memory SMF for `symbols` at `tempo_bpm`.
pub fn to_smf(symbols: &[Symbol], tempo_bpm: u32, options: &EncodeOptions) -> Result<Smf<'static>> {
    let micros = tempo_micros(tempo_bpm)?;
    if options.base_note > 127 - 11 {
        return Err(SoloError::InvalidParameter(format!(
            "base note {} leaves no room for a full octave",
            options.base_note
        )));
    }

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(options.ticks_per_beat)),
    ));

    let mut track: Track<'static> = Vec::with_capacity(symbols.len() * 2 + 3);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
    });
    track.push(midi_event(0, MidiMessage::ProgramChange { program: u7::new(0) }));

    let velocity = u7::new(options.velocity.min(127));
    for symbol in symbols {
        let Pitch::Class(pc) = symbol.pitch else {
            continue;
        };
        let key = u7::new(options.base_note + pc % 12);
        let ticks = duration_ticks(symbol.duration, options.ticks_per_beat);
        if ticks > MAX_DELTA_TICKS {
            return Err(SoloError::InvalidParameter(format!(
                "{symbol} is too long for a MIDI delta-time"
            )));
        }
        track.push(midi_event(0, MidiMessage::NoteOn { key, vel: velocity }));
        track.push(midi_event(ticks, MidiMessage::NoteOff { key, vel: velocity }));
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    Ok(smf)
}

/// Encode `symbols` as SMF bytes.
pub fn encode(symbols: &[Symbol], tempo_bpm: u32, options: &EncodeOptions) -> Result<Vec<u8>> {
    let smf = to_smf(symbols, tempo_bpm, options)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Encode `symbols` and write them to `path`.
pub fn write_midi(
    symbols: &[Symbol],
    tempo_bpm: u32,
    options: &EncodeOptions,
    path: &Path,
) -> Result<()> {
    let buf = encode(symbols, tempo_bpm, options)?;
    std::fs::write(path, &buf)?;
    log::info!("wrote {} bytes to {}", buf.len(), path.display());
    Ok(())
}
