//! Best-effort audio cues for the game.

use std::sync::Arc;

use fundsp::prelude::*;
use parking_lot::Mutex;
use rodio::{OutputStream, OutputStreamBuilder, Sink, buffer::SamplesBuffer};
use tracing::debug;

const SAMPLE_RATE: u32 = 44_100;

/// The two sounds the game makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Jump,
    Score,
}

impl Cue {
    /// Frequency in Hz and length in seconds.
    const fn shape(self) -> (f32, f32) {
        match self {
            Cue::Jump => (400.0, 0.10),
            Cue::Score => (600.0, 0.15),
        }
    }
}

/// Fire-and-forget cue output. Implementations must never fail loudly.
pub trait ToneSignaler {
    fn trigger(&self, cue: Cue);
}

/// No audio at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ToneSignaler for Silent {
    fn trigger(&self, _cue: Cue) {}
}

/// Remembers every cue it was asked to play. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTones(Arc<Mutex<Vec<Cue>>>);

impl RecordingTones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.0.lock().clone()
    }
}

impl ToneSignaler for RecordingTones {
    fn trigger(&self, cue: Cue) {
        self.0.lock().push(cue);
    }
}

/// Sine beeps rendered with fundsp and played through the default rodio
/// output device.
pub struct SynthTones {
    // Dropping the stream silences every sink attached to it.
    stream: OutputStream,
    jump: Vec<f32>,
    score: Vec<f32>,
}

impl SynthTones {
    /// Open the default output device. Fails when there is none; callers
    /// fall back to [`Silent`].
    pub fn open() -> Result<Self, rodio::StreamError> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        Ok(Self {
            stream,
            jump: render_cue(Cue::Jump),
            score: render_cue(Cue::Score),
        })
    }
}

impl ToneSignaler for SynthTones {
    fn trigger(&self, cue: Cue) {
        let samples = match cue {
            Cue::Jump => self.jump.clone(),
            Cue::Score => self.score.clone(),
        };
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
        sink.detach(); // Play in background
        debug!(?cue, "Tone triggered");
    }
}

/// Mono samples for a cue: a sine at the cue's pitch whose gain falls
/// exponentially from 0.1 to 0.01 over the cue's length.
fn render_cue(cue: Cue) -> Vec<f32> {
    let (freq, seconds) = cue.shape();
    let mut osc = sine_hz::<f32>(freq);
    osc.set_sample_rate(SAMPLE_RATE as f64);

    let len = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            osc.get_mono() * envelope(t, seconds)
        })
        .collect()
}

fn envelope(t: f32, seconds: f32) -> f32 {
    0.1 * (-std::f32::consts::LN_10 * (t / seconds).min(1.0)).exp()
}
