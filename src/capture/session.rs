//! The recording session state machine.
//!
//! `Idle → Recording → Idle`, with a single authoritative
//! `remaining_secs` counter and one transition rule: when it reaches zero
//! the session stops itself. `tick()` is driven externally at 1 Hz, so
//! none of this needs a real clock.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use super::source::AudioSource;
use super::CaptureError;

/// MIME type of finalized clips
pub const CLIP_CONTENT_TYPE: &str = "audio/wav";

/// A finalized, uploadable recording
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Local file holding the encoded audio
    pub path: PathBuf,

    /// Filename tag used for the upload part
    pub file_name: String,

    /// MIME type of the payload
    pub content_type: &'static str,

    /// Captured length in whole seconds
    pub duration_secs: u32,
}

/// Outcome of one countdown tick
#[derive(Debug)]
pub enum Tick {
    /// No recording active; nothing happened
    Idle,

    /// Still recording, `remaining_secs` left before auto-stop
    Running { remaining_secs: u32 },

    /// The countdown reached zero and the session stopped itself
    Finished(AudioClip),
}

enum State {
    Idle,
    Recording {
        remaining_secs: u32,
        samples: Vec<i16>,
    },
}

/// Owns one capture lifecycle and its time-box.
pub struct RecordingSession {
    source: Box<dyn AudioSource>,
    limit_secs: u32,
    out_dir: PathBuf,
    state: State,
}

impl RecordingSession {
    /// Create an idle session recording into `out_dir`, capped at
    /// `limit_secs` per recording.
    pub fn new(source: Box<dyn AudioSource>, limit_secs: u32, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            limit_secs,
            out_dir: out_dir.into(),
            state: State::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Seconds left before auto-stop, `None` while idle
    pub fn remaining_secs(&self) -> Option<u32> {
        match self.state {
            State::Recording { remaining_secs, .. } => Some(remaining_secs),
            State::Idle => None,
        }
    }

    /// Begin capturing and arm the countdown.
    ///
    /// Permission or device failures leave the session idle.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }

        self.source.start()?;
        self.state = State::Recording {
            remaining_secs: self.limit_secs,
            samples: Vec::new(),
        };

        info!(limit_secs = self.limit_secs, "recording started");
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// Drains captured samples, decrements the counter, and performs the
    /// stop transition itself when the counter hits zero.
    pub fn tick(&mut self) -> Result<Tick, CaptureError> {
        let State::Recording {
            remaining_secs,
            samples,
        } = &mut self.state
        else {
            return Ok(Tick::Idle);
        };

        samples.extend(self.source.read_samples()?);
        *remaining_secs = remaining_secs.saturating_sub(1);

        if *remaining_secs == 0 {
            debug!("countdown expired, stopping recording");
            // The session is recording here, so stop always yields a clip
            return match self.stop()? {
                Some(clip) => Ok(Tick::Finished(clip)),
                None => Ok(Tick::Idle),
            };
        }

        Ok(Tick::Running {
            remaining_secs: *remaining_secs,
        })
    }

    /// Stop capturing and finalize the clip.
    ///
    /// No-op returning `None` while idle. The countdown is dropped on
    /// every exit path, including failures, so no further ticks run after
    /// a stop.
    pub fn stop(&mut self) -> Result<Option<AudioClip>, CaptureError> {
        let State::Recording { mut samples, .. } =
            std::mem::replace(&mut self.state, State::Idle)
        else {
            return Ok(None);
        };

        self.source.stop()?;
        samples.extend(self.source.read_samples()?);

        let clip = self.write_clip(&samples)?;
        info!(path = %clip.path.display(), duration_secs = clip.duration_secs, "recording finalized");

        Ok(Some(clip))
    }

    /// Encode the samples as a WAV file in the recordings directory
    fn write_clip(&self, samples: &[i16]) -> Result<AudioClip, CaptureError> {
        std::fs::create_dir_all(&self.out_dir)?;

        let file_name = format!("braindump-{}.wav", Uuid::new_v4());
        let path = self.out_dir.join(&file_name);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.source.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer =
            hound::WavWriter::create(&path, spec).map_err(|e| CaptureError::Finalize {
                message: e.to_string(),
            })?;
        for &sample in samples {
            writer.write_sample(sample).map_err(|e| CaptureError::Finalize {
                message: e.to_string(),
            })?;
        }
        writer.finalize().map_err(|e| CaptureError::Finalize {
            message: e.to_string(),
        })?;

        let duration_secs = (samples.len() as u32) / self.source.sample_rate().max(1);

        Ok(AudioClip {
            path,
            file_name,
            content_type: CLIP_CONTENT_TYPE,
            duration_secs,
        })
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.is_recording() {
            // Best-effort device teardown; the countdown dies with us
            let _ = self.source.stop();
        }
    }
}

/// Build an `AudioClip` for an existing audio file (the `transcribe <file>`
/// flow), inferring the content type from the extension.
pub fn clip_from_file(path: &Path) -> Result<AudioClip, CaptureError> {
    if !path.exists() {
        return Err(CaptureError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("audio file not found: {}", path.display()),
        )));
    }

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let content_type: &'static str = match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/m4a",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    };

    Ok(AudioClip {
        path: path.to_path_buf(),
        file_name,
        content_type,
        duration_secs: 0,
    })
}
