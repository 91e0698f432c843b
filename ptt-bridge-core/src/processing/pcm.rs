//! PCM byte/sample helpers for the playback path.
//!
//! Incoming audio is raw s16le bytes of arbitrary length; devices want whole
//! samples, often as f32 at their own rate and channel count.

use crate::models::audio_format::PcmFormat;

/// Default device period used when a backend has no better figure.
pub const DEFAULT_PERIOD_MS: u32 = 20;

/// Bytes needed to hold `period_ms` of `format`, rounded up to whole frames.
///
/// Never returns less than one frame.
pub fn min_buffer_bytes(format: &PcmFormat, period_ms: u32) -> usize {
    let frames = (format.sample_rate as usize * period_ms as usize).div_ceil(1000);
    frames.max(1) * format.bytes_per_frame()
}

/// Streaming s16le decoder that carries a dangling odd byte between calls.
#[derive(Debug, Default, Clone)]
pub struct Pcm16Decoder {
    pending: Option<u8>,
}

impl Pcm16Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as many whole samples as `bytes` (plus any carried byte) holds.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<i16> {
        let mut samples = Vec::with_capacity((bytes.len() + 1) / 2);
        let mut rest = bytes;

        if let Some(low) = self.pending.take() {
            match rest.split_first() {
                Some((&high, tail)) => {
                    samples.push(i16::from_le_bytes([low, high]));
                    rest = tail;
                }
                None => {
                    self.pending = Some(low);
                    return samples;
                }
            }
        }

        let mut chunks = rest.chunks_exact(2);
        for pair in &mut chunks {
            samples.push(i16::from_le_bytes([pair[0], pair[1]]));
        }
        self.pending = chunks.remainder().first().copied();
        samples
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }
}

/// Convert a 16-bit sample to f32 in `[-1.0, 1.0]`.
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

/// Duplicate mono samples across `channels` interleaved channels.
pub fn upmix_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let mut out = Vec::with_capacity(samples.len() * channels);
    for &s in samples {
        out.extend(std::iter::repeat(s).take(channels));
    }
    out
}

/// Streaming linear-interpolation rate converter for mono audio.
///
/// Interpolates between the two most recent input samples and keeps them,
/// with the fractional position, across calls so consecutive device periods
/// join without clicks.
#[derive(Debug, Clone)]
pub struct RateConverter {
    step: f64,
    position: f64,
    current: f32,
    next: f32,
    primed: bool,
}

impl RateConverter {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            step: source_rate as f64 / target_rate as f64,
            position: 0.0,
            current: 0.0,
            next: 0.0,
            primed: false,
        }
    }

    /// Input samples `process` will consume to produce `output_len` samples.
    pub fn input_needed(&self, output_len: usize) -> usize {
        let advance = (self.position + self.step * output_len as f64).floor() as usize;
        advance + usize::from(!self.primed)
    }

    /// Produce `output.len()` samples, consuming input in order.
    ///
    /// Input beyond what is supplied is treated as silence.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let mut source = input.iter().copied();
        if !self.primed {
            self.next = source.next().unwrap_or(0.0);
            self.primed = true;
        }

        for sample in output.iter_mut() {
            let fraction = self.position as f32;
            *sample = self.current * (1.0 - fraction) + self.next * fraction;
            self.position += self.step;
            while self.position >= 1.0 {
                self.current = self.next;
                self.next = source.next().unwrap_or(0.0);
                self.position -= 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn min_buffer_for_voice() {
        assert_eq!(min_buffer_bytes(&PcmFormat::VOICE, 20), 320);
        assert_eq!(min_buffer_bytes(&PcmFormat::VOICE, 0), 2);
    }

    #[test]
    fn decode_even_buffer() {
        let mut dec = Pcm16Decoder::new();
        let samples = dec.decode(&[0x01, 0x00, 0xff, 0x7f, 0x00, 0x80]);
        assert_eq!(samples, vec![1, i16::MAX, i16::MIN]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn decode_carries_odd_byte() {
        let mut dec = Pcm16Decoder::new();
        assert_eq!(dec.decode(&[0x34, 0x12, 0x78]), vec![0x1234]);
        assert!(dec.has_pending());
        assert!(dec.decode(&[]).is_empty());
        assert_eq!(dec.decode(&[0x56]), vec![0x5678]);
        assert!(!dec.has_pending());
    }

    #[test]
    fn sample_conversion() {
        assert_relative_eq!(i16_to_f32(0), 0.0);
        assert_relative_eq!(i16_to_f32(i16::MAX), 1.0);
        assert!(i16_to_f32(i16::MIN) < -1.0 + 1e-4);
    }

    #[test]
    fn upmix_duplicates() {
        assert_eq!(upmix_mono(&[0.5, -0.5], 2), vec![0.5, 0.5, -0.5, -0.5]);
        assert_eq!(upmix_mono(&[0.1], 1), vec![0.1]);
    }

    #[test]
    fn same_rate_consumes_one_per_output() {
        let mut conv = RateConverter::new(8000, 8000);
        assert_eq!(conv.input_needed(4), 5);
        let mut out = [0.0f32; 4];
        conv.process(&[0.1, 0.2, 0.3, 0.4, 0.5], &mut out);
        assert_eq!(out, [0.0, 0.1, 0.2, 0.3]);
        assert_eq!(conv.input_needed(4), 4);
    }

    #[test]
    fn upsample_6x_consumes_proportionally() {
        let mut conv = RateConverter::new(8000, 48000);
        let needed = conv.input_needed(480);
        assert!((80..=81).contains(&needed));

        let input = vec![0.5f32; needed];
        let mut out = vec![0.0f32; 480];
        conv.process(&input, &mut out);

        // Ramp-in from silence, then steady state.
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[479], 0.5, epsilon = 1e-6);
        assert!((79..=81).contains(&conv.input_needed(480)));
    }

    #[test]
    fn upsample_interpolates_between_samples() {
        let mut conv = RateConverter::new(8000, 16000);
        let mut out = [0.0f32; 4];
        conv.process(&[1.0, 1.0, 1.0], &mut out);
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-6);
        assert_relative_eq!(out[2], 1.0, epsilon = 1e-6);
        assert_relative_eq!(out[3], 1.0, epsilon = 1e-6);
    }
}
