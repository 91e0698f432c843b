//! PCM playback through cpal.
//!
//! A cpal `Stream` is not `Send`, so each opened stream lives on its own
//! `cpal-output` thread and is driven over a command channel. Written bytes
//! go through a `PcmQueue`; the device callback drains it, converts 8 kHz
//! mono to the device rate and channel count, and plays silence when the
//! queue runs dry.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, SupportedBufferSize, SupportedStreamConfig};

use ptt_bridge_core::models::audio_format::{OutputCapabilities, PcmFormat, StreamConfig};
use ptt_bridge_core::models::error::BridgeError;
use ptt_bridge_core::processing::pcm::{
    i16_to_f32, min_buffer_bytes, upmix_mono, Pcm16Decoder, RateConverter, DEFAULT_PERIOD_MS,
};
use ptt_bridge_core::processing::ring_buffer::PcmQueue;
use ptt_bridge_core::traits::audio_output::{AudioOutputBackend, PcmStream};

/// Device buffers of headroom the queue holds before writers block.
const QUEUE_PERIODS: usize = 4;

/// Output backend on the default device of the default cpal host.
///
/// cpal has no notion of usage/content attributes, so streams are opened on
/// the legacy route.
pub struct CpalOutput {
    host: Host,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn device(&self) -> Result<Device, BridgeError> {
        self.host
            .default_output_device()
            .ok_or(BridgeError::DeviceNotAvailable)
    }

    fn device_config(device: &Device) -> Result<SupportedStreamConfig, BridgeError> {
        device
            .default_output_config()
            .map_err(|e| BridgeError::ConfigurationFailed(format!("no default output config: {}", e)))
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes of `format` that cover `device_frames` frames at `device_rate`.
fn source_bytes_for(format: &PcmFormat, device_frames: u32, device_rate: u32) -> usize {
    let frames = (device_frames as u64 * format.sample_rate as u64).div_ceil(device_rate.max(1) as u64);
    frames as usize * format.bytes_per_frame()
}

impl AudioOutputBackend for CpalOutput {
    fn is_available(&self) -> bool {
        self.host.default_output_device().is_some()
    }

    fn capabilities(&self) -> OutputCapabilities {
        OutputCapabilities {
            supports_audio_attributes: false,
        }
    }

    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, BridgeError> {
        let device = self.device()?;
        let supported = Self::device_config(&device)?;
        let floor = min_buffer_bytes(format, DEFAULT_PERIOD_MS);

        Ok(match supported.buffer_size() {
            SupportedBufferSize::Range { min, .. } => {
                source_bytes_for(format, *min, supported.sample_rate().0).max(floor)
            }
            SupportedBufferSize::Unknown => floor,
        })
    }

    fn open_stream(&mut self, config: &StreamConfig) -> Result<Box<dyn PcmStream>, BridgeError> {
        let device = self.device()?;
        let supported = Self::device_config(&device)?;
        let device_name = device.name().unwrap_or_else(|_| "default output".into());

        let capacity = (config.buffer_size_bytes / config.format.bytes_per_frame()).max(1) * QUEUE_PERIODS;
        let queue = Arc::new(PcmQueue::new(capacity));
        let (control_tx, control_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let worker_queue = Arc::clone(&queue);
        let source_rate = config.format.sample_rate;
        let worker = thread::Builder::new()
            .name("cpal-output".into())
            .spawn(move || run_device(device, supported, source_rate, worker_queue, control_rx, ready_tx))
            .map_err(|e| BridgeError::StreamFailed(format!("failed to spawn output thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(BridgeError::StreamFailed("output thread exited".into()));
            }
        }

        log::info!("opened output stream on {} ({} sample queue)", device_name, capacity);
        Ok(Box::new(CpalStream {
            queue,
            decoder: Pcm16Decoder::new(),
            control: Some(control_tx),
            worker: Some(worker),
        }))
    }
}

type Ack = Sender<Result<(), BridgeError>>;

enum Control {
    Play(Ack),
    Pause(Ack),
}

/// Body of the `cpal-output` thread. The stream is dropped when the
/// control channel closes.
fn run_device(
    device: Device,
    supported: SupportedStreamConfig,
    source_rate: u32,
    queue: Arc<PcmQueue>,
    control: Receiver<Control>,
    ready: SyncSender<Result<(), BridgeError>>,
) {
    let stream = match build_stream(&device, &supported, source_rate, queue) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while let Ok(command) = control.recv() {
        match command {
            Control::Play(ack) => {
                let _ = ack.send(stream.play().map_err(|e| BridgeError::StreamFailed(e.to_string())));
            }
            Control::Pause(ack) => {
                let _ = ack.send(stream.pause().map_err(|e| BridgeError::StreamFailed(e.to_string())));
            }
        }
    }
    log::debug!("output stream closed");
}

fn build_stream(
    device: &Device,
    supported: &SupportedStreamConfig,
    source_rate: u32,
    queue: Arc<PcmQueue>,
) -> Result<cpal::Stream, BridgeError> {
    let config = supported.config();
    let mut renderer = Renderer::new(queue, source_rate, config.sample_rate.0, config.channels as usize);
    let on_error = |e: cpal::StreamError| log::error!("output stream error: {}", e);

    let stream = match supported.sample_format() {
        SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| renderer.render_i16(data),
            on_error,
            None,
        ),
        other => {
            return Err(BridgeError::ConfigurationFailed(format!(
                "unsupported device sample format {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| BridgeError::StreamFailed(format!("failed to build output stream: {}", e)))
}

/// Fills device buffers from the queue.
struct Renderer {
    queue: Arc<PcmQueue>,
    converter: RateConverter,
    channels: usize,
    pulled: Vec<i16>,
    source: Vec<f32>,
    mono: Vec<f32>,
    scratch: Vec<f32>,
}

impl Renderer {
    fn new(queue: Arc<PcmQueue>, source_rate: u32, device_rate: u32, channels: usize) -> Self {
        Self {
            queue,
            converter: RateConverter::new(source_rate, device_rate),
            channels: channels.max(1),
            pulled: Vec::new(),
            source: Vec::new(),
            mono: Vec::new(),
            scratch: Vec::new(),
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        let frames = out.len() / self.channels;
        let needed = self.converter.input_needed(frames);

        self.pulled.resize(needed, 0);
        self.queue.pull(&mut self.pulled);
        self.source.clear();
        self.source.extend(self.pulled.iter().map(|&s| i16_to_f32(s)));

        self.mono.resize(frames, 0.0);
        self.converter.process(&self.source, &mut self.mono);

        let interleaved = upmix_mono(&self.mono, self.channels);
        out[..interleaved.len()].copy_from_slice(&interleaved);
        out[interleaved.len()..].fill(0.0);
    }

    fn render_i16(&mut self, out: &mut [i16]) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.resize(out.len(), 0.0);
        self.render(&mut scratch);
        for (dst, &s) in out.iter_mut().zip(&scratch) {
            *dst = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        }
        self.scratch = scratch;
    }
}

struct CpalStream {
    queue: Arc<PcmQueue>,
    decoder: Pcm16Decoder,
    control: Option<Sender<Control>>,
    worker: Option<JoinHandle<()>>,
}

impl CpalStream {
    fn command(&self, make: fn(Ack) -> Control) -> Result<(), BridgeError> {
        let control = self
            .control
            .as_ref()
            .ok_or_else(|| BridgeError::StreamFailed("stream released".into()))?;
        let (ack, reply) = mpsc::channel();
        control
            .send(make(ack))
            .map_err(|_| BridgeError::StreamFailed("output thread exited".into()))?;
        reply
            .recv()
            .map_err(|_| BridgeError::StreamFailed("output thread exited".into()))?
    }
}

impl PcmStream for CpalStream {
    fn play(&mut self) -> Result<(), BridgeError> {
        self.command(Control::Play)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        if self.queue.is_closed() {
            return Err(BridgeError::StreamFailed("stream released".into()));
        }
        let samples = self.decoder.decode(data);
        if self.queue.push(&samples) < samples.len() {
            return Err(BridgeError::StreamFailed("stream closed during write".into()));
        }
        Ok(data.len())
    }

    fn stop(&mut self) -> Result<(), BridgeError> {
        let paused = self.command(Control::Pause);
        self.queue.clear();
        self.decoder.reset();
        paused
    }

    fn release(&mut self) {
        self.queue.close();
        self.control = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("output thread panicked");
            }
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}
