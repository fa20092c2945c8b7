//! Live microphone capture via cpal.
//!
//! The device is requested on a background thread so a slow backend or a
//! permission prompt never holds up the frame loop. That thread also owns the
//! cpal stream for its whole life, since streams cannot move between threads
//! on every backend. The capture callback only pushes mono samples into a
//! shared ring; analysis happens on the game thread in
//! [`Microphone::refresh`], once per frame.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{EnergyBand, EnergySource, SpectrumAnalyzer};
use crate::config::AudioTuning;
use crate::error::AudioError;

/// Most recent mono samples, oldest first.
struct SampleRing {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MicStatus {
    /// No device yet: not requested, or the request is still pending.
    Unopened,
    Live { device: String, sample_rate: u32 },
    /// Opening failed; every reading is zero for the rest of the session.
    Silent(AudioError),
}

/// A started input, as handed back by an opener.
struct Opened<S> {
    /// Keeps capture running until dropped.
    stream: S,
    device: String,
    sample_rate: u32,
}

/// The in-flight or resolved device request.
struct Request {
    /// Set once by the open thread, taken by [`Microphone::refresh`].
    resolved: Arc<Mutex<Option<MicStatus>>>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// The session's one microphone.
///
/// Starts silent; [`open`](Self::open) requests the default input device in
/// the background. A failed open is logged and leaves the source silent
/// instead of erroring.
pub struct Microphone {
    tuning: AudioTuning,
    status: MicStatus,
    ring: Arc<Mutex<SampleRing>>,
    request: Option<Request>,
    analyzer: Option<SpectrumAnalyzer>,
    window: Vec<f32>,
}

impl fmt::Debug for Microphone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Microphone").field("status", &self.status).finish()
    }
}

impl Microphone {
    pub fn new(tuning: AudioTuning) -> Self {
        Self {
            ring: Arc::new(Mutex::new(SampleRing::new(tuning.fft_size))),
            window: Vec::with_capacity(tuning.fft_size),
            tuning,
            status: MicStatus::Unopened,
            request: None,
            analyzer: None,
        }
    }

    pub fn status(&self) -> &MicStatus {
        &self.status
    }

    /// Request the default input device and start capturing. Returns at once;
    /// the outcome shows up in [`status`](Self::status) on a later
    /// [`refresh`](Self::refresh).
    ///
    /// Only the first call does anything.
    pub fn open(&mut self) {
        self.open_with(open_default_device);
    }

    fn open_with<F, S>(&mut self, opener: F)
    where
        F: FnOnce(Arc<Mutex<SampleRing>>) -> Result<Opened<S>, AudioError> + Send + 'static,
        S: 'static,
    {
        if self.request.is_some() || self.status != MicStatus::Unopened {
            return;
        }

        let resolved = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let ring = self.ring.clone();
        let (publish, stopped) = (resolved.clone(), stop.clone());

        let spawned = thread::Builder::new()
            .name("mic-open".to_string())
            .spawn(move || match opener(ring) {
                Ok(opened) => {
                    info!(device = %opened.device, sample_rate = opened.sample_rate, "microphone live");
                    *publish.lock() = Some(MicStatus::Live {
                        device: opened.device,
                        sample_rate: opened.sample_rate,
                    });
                    while !stopped.load(Ordering::Acquire) {
                        thread::park();
                    }
                    drop(opened.stream);
                    debug!("microphone closed");
                }
                Err(err) => {
                    warn!(%err, "microphone unavailable, continuing without audio input");
                    *publish.lock() = Some(MicStatus::Silent(err));
                }
            });

        match spawned {
            Ok(handle) => {
                debug!("microphone requested");
                self.request = Some(Request {
                    resolved,
                    stop,
                    handle,
                });
            }
            Err(err) => {
                let err = AudioError::DeviceUnavailable(format!("could not start capture thread: {err}"));
                warn!(%err, "microphone unavailable, continuing without audio input");
                self.status = MicStatus::Silent(err);
            }
        }
    }

    /// Pick up a finished open request, then analyze the latest capture
    /// window. Call once per frame before reading energy.
    pub fn refresh(&mut self) {
        if self.analyzer.is_none() {
            self.poll_request();
        }
        let Some(analyzer) = self.analyzer.as_mut() else {
            return;
        };
        self.window.clear();
        self.window.extend(self.ring.lock().samples.iter().copied());
        analyzer.analyze(&self.window);
    }

    fn poll_request(&mut self) {
        let Some(request) = &self.request else {
            return;
        };
        let Some(status) = request.resolved.lock().take() else {
            return;
        };
        if let MicStatus::Live { sample_rate, .. } = &status {
            self.analyzer = Some(SpectrumAnalyzer::new(&self.tuning, *sample_rate));
        }
        self.status = status;
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        // Not joined: the open may still be stuck inside the backend.
        if let Some(request) = &self.request {
            request.stop.store(true, Ordering::Release);
            request.handle.thread().unpark();
        }
    }
}

impl EnergySource for Microphone {
    fn energy(&self, band: EnergyBand) -> f32 {
        match &self.analyzer {
            Some(analyzer) => analyzer.band_energy(band),
            None => 0.0,
        }
    }
}

fn open_default_device(ring: Arc<Mutex<SampleRing>>) -> Result<Opened<cpal::Stream>, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default input device".to_string()))?;
    let name = device.name().unwrap_or_else(|_| "unknown device".to_string());

    let supported = device.default_input_config().map_err(|err| match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable(format!("{name} disappeared"))
        }
        other => classify(other.to_string()),
    })?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    debug!(device = %name, ?sample_format, channels = config.channels, rate = config.sample_rate.0, "opening input stream");

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, ring),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, ring),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, ring),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, ring),
        other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
    }
    .map_err(|err| match err {
        cpal::BuildStreamError::DeviceNotAvailable => {
            AudioError::DeviceUnavailable(format!("{name} disappeared"))
        }
        other => classify(other.to_string()),
    })?;
    stream.play().map_err(|err| classify(err.to_string()))?;

    Ok(Opened {
        stream,
        device: name,
        sample_rate: config.sample_rate.0,
    })
}

/// Backends report permission problems as free-form text.
fn classify(message: String) -> AudioError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        AudioError::PermissionDenied(message)
    } else {
        AudioError::DeviceUnavailable(message)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<Mutex<SampleRing>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut ring = ring.lock();
            for frame in data.chunks(channels) {
                let sum: f32 = frame.iter().map(|&s| s.to_sample::<f32>()).sum();
                ring.push(sum / frame.len() as f32);
            }
        },
        |err| warn!(%err, "microphone stream error"),
        None,
    )
}
