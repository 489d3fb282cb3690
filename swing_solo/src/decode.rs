// MIDI decoding: Standard MIDI File bytes to melodic symbols.
//
// The decoder walks every track in file order, converting tick deltas to
// seconds under the tempo in force, pairing note-ons with note-offs and
// inserting a rest wherever the gap since the last note-off is longer than
// a sixteenth. Each finished note or rest is quantized (see quantize.rs)
// and its pitch normalized into the shared pitch-class space (see key.rs).
//
// Tracks are not merged by time: each one is played through from its own
// time zero before the next starts. Tempo carries over from one track to
// the next, so a conductor track's tempo applies to the melody tracks that
// follow it. Monophonic input is assumed; a second note-on for a pitch that
// is already sounding restarts it.

use crate::error::{Result, SoloError};
use crate::key::{Key, key_from_filename};
use crate::quantize::quantize;
use crate::symbol::{Beats, Pitch, Symbol};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Tempo assumed until the file sets one.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// A decoded note or rest with its timing, before it becomes a `Symbol`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNote {
    pub pitch: Pitch,
    /// Seconds from the start of the track.
    pub start_time: f64,
    pub end_time: f64,
    pub duration: Beats,
}

impl ParsedNote {
    pub fn symbol(&self) -> Symbol {
        Symbol {
            pitch: self.pitch,
            duration: self.duration,
        }
    }
}

/// Running state of one decode pass.
struct Decoder {
    ticks_per_beat: f64,
    transpose_offset: i32,
    tempo_bpm: f64,
    tempo_set: bool,
    /// Seconds at the last tempo change, and ticks elapsed since it.
    segment_start: f64,
    segment_ticks: u64,
    current_time: f64,
    last_note_off: f64,
    /// Raw MIDI key -> start time of the sounding note.
    open_notes: FxHashMap<u8, f64>,
    notes: Vec<ParsedNote>,
}

impl Decoder {
    fn new(ticks_per_beat: u16, key: &Key) -> Self {
        Decoder {
            ticks_per_beat: ticks_per_beat as f64,
            transpose_offset: key.offset() as i32,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            tempo_set: false,
            segment_start: 0.0,
            segment_ticks: 0,
            current_time: 0.0,
            last_note_off: 0.0,
            open_notes: FxHashMap::default(),
            notes: Vec::new(),
        }
    }

    fn start_track(&mut self) {
        self.segment_start = 0.0;
        self.segment_ticks = 0;
        self.current_time = 0.0;
        self.last_note_off = 0.0;
        self.open_notes.clear();
    }

    // Seconds are recomputed from the tick count of the current tempo
    // segment rather than summed per event, so grid-aligned events land on
    // exact times.
    fn advance(&mut self, delta_ticks: u32) {
        self.segment_ticks += delta_ticks as u64;
        self.current_time = self.segment_start
            + (self.segment_ticks as f64 * 60.0) / (self.tempo_bpm * self.ticks_per_beat);
    }

    fn set_tempo(&mut self, micros_per_beat: u32) -> Result<()> {
        if micros_per_beat == 0 {
            return Err(SoloError::Decode("tempo event of 0 microseconds per beat".into()));
        }
        self.segment_start = self.current_time;
        self.segment_ticks = 0;
        self.tempo_bpm = 60_000_000.0 / micros_per_beat as f64;
        self.tempo_set = true;
        log::debug!("tempo change to {:.2} BPM at {:.3}s", self.tempo_bpm, self.current_time);
        Ok(())
    }

    fn duration(&self, seconds: f64) -> Result<Beats> {
        quantize(seconds, self.tempo_bpm)
            .ok_or_else(|| SoloError::Decode(format!("duration out of range ({seconds:.3e}s)")))
    }

    fn note_on(&mut self, key: u8) -> Result<()> {
        if !self.tempo_set {
            log::warn!("no tempo event before the first note; assuming {DEFAULT_TEMPO_BPM} BPM");
            self.tempo_set = true;
        }

        let gap = self.current_time - self.last_note_off;
        let sixteenth = 60.0 / self.tempo_bpm / 4.0;
        if gap > sixteenth {
            self.notes.push(ParsedNote {
                pitch: Pitch::Rest,
                start_time: self.last_note_off,
                end_time: self.current_time,
                duration: self.duration(gap)?,
            });
        }
        self.open_notes.insert(key, self.current_time);
        Ok(())
    }

    fn note_off(&mut self, key: u8) -> Result<()> {
        let Some(start_time) = self.open_notes.remove(&key) else {
            return Ok(());
        };
        self.notes.push(ParsedNote {
            pitch: Pitch::from_semitone(key as i32 + self.transpose_offset),
            start_time,
            end_time: self.current_time,
            duration: self.duration(self.current_time - start_time)?,
        });
        self.last_note_off = self.current_time;
        Ok(())
    }

    fn feed(&mut self, event: &TrackEvent<'_>) -> Result<()> {
        self.advance(event.delta.as_int());
        match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => self.set_tempo(micros.as_int())?,
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => self.note_on(key.as_int())?,
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    self.note_off(key.as_int())?
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }
}

/// Decode MIDI bytes into timed notes and rests, normalized from `key`.
pub fn parse_notes(data: &[u8], key: &Key) -> Result<Vec<ParsedNote>> {
    let smf = Smf::parse(data).map_err(|e| SoloError::Decode(e.to_string()))?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) if tpb.as_int() > 0 => tpb.as_int(),
        Timing::Metrical(_) => {
            return Err(SoloError::Decode("header declares 0 ticks per beat".into()));
        }
        Timing::Timecode(..) => {
            return Err(SoloError::Decode("SMPTE timecode timing is not supported".into()));
        }
    };

    let mut decoder = Decoder::new(ticks_per_beat, key);
    for track in &smf.tracks {
        decoder.start_track();
        for event in track {
            decoder.feed(event)?;
        }
    }
    Ok(decoder.notes)
}

/// Decode MIDI bytes into symbols, normalized from `key`.
pub fn decode(data: &[u8], key: &Key) -> Result<Vec<Symbol>> {
    Ok(parse_notes(data, key)?.iter().map(ParsedNote::symbol).collect())
}

/// Decode a MIDI file. Without an explicit key, the key is inferred from the
/// file name (see `key::key_from_filename`).
pub fn decode_file(path: &Path, key: Option<&Key>) -> Result<Vec<Symbol>> {
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SoloError::NotFound(path.to_path_buf()),
        _ => SoloError::Io(e),
    })?;
    let key = match key {
        Some(key) => *key,
        None => key_from_filename(path)
            .ok_or_else(|| SoloError::KeyResolution(path.to_path_buf()))?,
    };
    let symbols = decode(&data, &key)?;
    log::debug!("decoded {} symbols from {} ({key})", symbols.len(), path.display());
    Ok(symbols)
}
