use serde::{Deserialize, Serialize};

/// Sample encoding of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// 16-bit signed little-endian linear PCM.
    Pcm16Le,
}

impl SampleEncoding {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Pcm16Le => 2,
        }
    }
}

/// Output channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    #[serde(rename = "mono")]
    Mono,
}

impl ChannelLayout {
    pub fn channel_count(&self) -> u16 {
        match self {
            Self::Mono => 1,
        }
    }
}

/// How buffers reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Buffers are pushed continuously while the stream plays.
    Stream,
}

/// What the stream carries, used by the platform for routing and processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Speech,
    Music,
}

/// Usage priority the platform uses for focus and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    Media,
}

/// Legacy stream category for backends without attribute support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Music,
}

/// Routing hint handed to the backend when a stream is opened.
///
/// Backends that understand usage/content attributes get `Attributes`;
/// older ones get a legacy stream type. Both describe the same media route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteHint {
    Attributes { usage: Usage, content: ContentType },
    LegacyStream(StreamType),
}

/// Fixed PCM format description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub layout: ChannelLayout,
    pub encoding: SampleEncoding,
}

impl PcmFormat {
    /// The push-to-talk voice format: 8 kHz, mono, s16le.
    pub const VOICE: PcmFormat = PcmFormat {
        sample_rate: 8000,
        layout: ChannelLayout::Mono,
        encoding: SampleEncoding::Pcm16Le,
    };

    pub fn channels(&self) -> u16 {
        self.layout.channel_count()
    }

    /// Bytes in one frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.encoding.bytes_per_sample() * self.channels() as usize
    }

    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.bytes_per_frame()
    }

    /// Playback duration of `bytes` in milliseconds.
    pub fn duration_ms(&self, bytes: usize) -> f64 {
        bytes as f64 * 1000.0 / self.byte_rate() as f64
    }
}

/// What a backend can do, used to pick the stream construction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputCapabilities {
    pub supports_audio_attributes: bool,
}

/// Everything a backend needs to open a playback stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub format: PcmFormat,
    pub buffer_size_bytes: usize,
    pub transfer_mode: TransferMode,
    pub route: RouteHint,
}

impl StreamConfig {
    /// Build the speech-tuned streaming configuration for `format`.
    ///
    /// The route hint depends on backend capabilities; format, buffer size
    /// and transfer mode do not.
    pub fn speech(format: PcmFormat, buffer_size_bytes: usize, caps: OutputCapabilities) -> Self {
        let route = if caps.supports_audio_attributes {
            RouteHint::Attributes {
                usage: Usage::Media,
                content: ContentType::Speech,
            }
        } else {
            RouteHint::LegacyStream(StreamType::Music)
        };

        Self {
            format,
            buffer_size_bytes,
            transfer_mode: TransferMode::Stream,
            route,
        }
    }
}
