//! Audio source abstraction.
//!
//! The session records from anything that can start, stop, and hand over
//! 16-bit PCM samples. The real implementation is `MicrophoneSource`;
//! `MockAudioSource` drives the state machine in tests and headless runs.

use super::CaptureError;

/// A device that produces 16-bit PCM samples.
pub trait AudioSource: Send {
    /// Begin capturing. Permission and device failures surface here.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing. Samples already buffered stay readable.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Drain the samples captured since the last read.
    fn read_samples(&mut self) -> Result<Vec<i16>, CaptureError>;

    /// Sample rate of the produced PCM
    fn sample_rate(&self) -> u32;
}

/// Scripted audio source for tests.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    started: bool,
    samples_per_read: Vec<i16>,
    deny_permission: bool,
    fail_stop: bool,
}

impl MockAudioSource {
    pub fn new() -> Self {
        Self {
            started: false,
            samples_per_read: vec![0i16; 160],
            deny_permission: false,
            fail_stop: false,
        }
    }

    /// Samples returned by every `read_samples` call
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples_per_read = samples;
        self
    }

    /// Make `start` fail like a denied microphone prompt
    pub fn with_permission_denied(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Make `stop` fail like a device teardown error
    pub fn with_stop_failure(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::Permission {
                message: "microphone access denied".to_string(),
            });
        }

        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if self.fail_stop {
            return Err(CaptureError::Device {
                message: "mock stop failure".to_string(),
            });
        }

        self.started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>, CaptureError> {
        Ok(self.samples_per_read.clone())
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}
