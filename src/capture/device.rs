//! Real microphone capture using CPAL.
//!
//! Captures 16-bit PCM at 16 kHz mono, the cheapest format the remote
//! transcription models accept. Tries the preferred config first, then a
//! float variant, then the device's native config with software channel
//! mixing and resampling.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::source::AudioSource;
use super::CaptureError;

/// Capture sample rate expected by the transcription upload
pub const SAMPLE_RATE: u32 = 16_000;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched under the Mutex in
/// `MicrophoneSource`, so it never crosses threads concurrently.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone-backed audio source
pub struct MicrophoneSource {
    device: cpal::Device,
    stream: Mutex<Option<SendableStream>>,
    buffer: Arc<Mutex<Vec<i16>>>,
}

impl MicrophoneSource {
    /// Open a microphone, by name or the system default.
    ///
    /// A missing default input device is reported as a permission problem:
    /// on sandboxed hosts denied microphone access looks exactly like
    /// having no input device at all.
    pub fn new(device_name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut found = None;
                let devices = host.input_devices().map_err(|e| CaptureError::Device {
                    message: format!("failed to enumerate input devices: {}", e),
                })?;
                for dev in devices {
                    if dev.name().map(|n| n == name).unwrap_or(false) {
                        found = Some(dev);
                        break;
                    }
                }
                found.ok_or_else(|| CaptureError::Device {
                    message: format!("input device not found: {}", name),
                })?
            }
            None => host
                .default_input_device()
                .ok_or_else(|| CaptureError::Permission {
                    message: "no input device available (microphone missing or access denied)"
                        .to_string(),
                })?,
        };

        Ok(Self {
            device,
            stream: Mutex::new(None),
            buffer: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// List input device names, for `record --device`
    pub fn list_devices() -> Result<Vec<String>, CaptureError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| CaptureError::Device {
            message: format!("failed to enumerate input devices: {}", e),
        })?;

        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn build_stream(&self) -> Result<cpal::Stream, CaptureError> {
        let preferred = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            tracing::warn!(error = %err, "audio stream error");
        };

        // i16/16kHz/mono: PipeWire/PulseAudio convert transparently
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32/16kHz/mono, for devices that only expose float formats
        let buffer = Arc::clone(&self.buffer);
        if let Ok(stream) = self.device.build_input_stream(
            &preferred,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend(
                        data.iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                    );
                }
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native()
    }

    /// Capture at the device's native config, converting in software
    fn build_stream_native(&self) -> Result<cpal::Stream, CaptureError> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| CaptureError::Device {
                    message: format!("failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        let err_callback = |err| {
            tracing::warn!(error = %err, "audio stream error");
        };

        let buffer = Arc::clone(&self.buffer);

        match default_config.sample_format() {
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let converted =
                            convert_to_mono(data, native_channels, native_rate, SAMPLE_RATE);
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| CaptureError::Device {
                    message: format!("failed to build native i16 stream: {}", e),
                }),
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let i16_data: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        let converted =
                            convert_to_mono(&i16_data, native_channels, native_rate, SAMPLE_RATE);
                        if let Ok(mut buf) = buffer.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| CaptureError::Device {
                    message: format!("failed to build native f32 stream: {}", e),
                }),
            fmt => Err(CaptureError::Device {
                message: format!("unsupported native sample format: {:?}", fmt),
            }),
        }
    }
}

impl AudioSource for MicrophoneSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        {
            let guard = self.stream.lock().expect("stream lock poisoned");
            if guard.is_some() {
                return Ok(()); // already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| CaptureError::Device {
            message: format!("failed to start audio stream: {}", e),
        })?;

        *self.stream.lock().expect("stream lock poisoned") = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let mut guard = self.stream.lock().expect("stream lock poisoned");
        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| CaptureError::Device {
                message: format!("failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>, CaptureError> {
        let mut buffer = self.buffer.lock().map_err(|e| CaptureError::Device {
            message: format!("failed to lock audio buffer: {}", e),
        })?;

        Ok(std::mem::take(&mut *buffer))
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Mix multi-channel audio to mono and resample to the target rate
fn convert_to_mono(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    let mono: Vec<i16> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    if source_rate == target_rate {
        return mono;
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let out_len = (mono.len() as f64 / ratio) as usize;
    (0..out_len)
        .map(|i| mono[((i as f64 * ratio) as usize).min(mono.len().saturating_sub(1))])
        .collect()
}
