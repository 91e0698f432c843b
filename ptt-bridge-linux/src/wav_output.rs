//! WAV capture sink.
//!
//! Each opened stream becomes one `ptt_<uuid>.wav` file: a 44-byte RIFF
//! header followed by the raw s16le bytes exactly as written. Sizes in the
//! header are patched when the stream stops or is released. Files are never
//! removed; the directory grows by one file per session until cleaned by
//! whoever owns it.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use uuid::Uuid;

use ptt_bridge_core::models::audio_format::{OutputCapabilities, PcmFormat, StreamConfig};
use ptt_bridge_core::models::error::BridgeError;
use ptt_bridge_core::processing::pcm::{min_buffer_bytes, DEFAULT_PERIOD_MS};
use ptt_bridge_core::traits::audio_output::{AudioOutputBackend, PcmStream};

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Build a PCM WAV header for `format` with `data_size` bytes of samples.
///
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-15]   "WAVE" "fmt "
/// [16-19]  16, [20-21] 1 (PCM)
/// [22-23]  channels, [24-27] sample_rate
/// [28-31]  byte_rate, [32-33] block_align, [34-35] bits per sample
/// [36-39]  "data", [40-43] data_size
/// ```
pub fn wav_header(format: &PcmFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let channels = format.channels();
    let bits_per_sample = (format.encoding.bytes_per_sample() * 8) as u16;
    let block_align = format.bytes_per_frame() as u16;
    let byte_rate = format.byte_rate() as u32;

    let mut header = [0u8; WAV_HEADER_SIZE];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&36u32.saturating_add(data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    header
}

/// Output backend that records every session to a WAV file in `directory`.
///
/// Nothing is kept in memory per session and nothing is deleted, so a
/// long-running bridge leaves one file per talk burst on disk.
pub struct WavFileOutput {
    directory: PathBuf,
}

impl WavFileOutput {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl AudioOutputBackend for WavFileOutput {
    fn is_available(&self) -> bool {
        true
    }

    fn capabilities(&self) -> OutputCapabilities {
        OutputCapabilities {
            supports_audio_attributes: true,
        }
    }

    fn min_buffer_size(&self, format: &PcmFormat) -> Result<usize, BridgeError> {
        Ok(min_buffer_bytes(format, DEFAULT_PERIOD_MS))
    }

    fn open_stream(&mut self, config: &StreamConfig) -> Result<Box<dyn PcmStream>, BridgeError> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| BridgeError::ConfigurationFailed(format!("failed to create directory: {}", e)))?;

        let path = self.directory.join(format!("ptt_{}.wav", Uuid::new_v4()));
        let mut file = File::create(&path)
            .map_err(|e| BridgeError::ConfigurationFailed(format!("failed to create file: {}", e)))?;
        file.write_all(&wav_header(&config.format, 0))
            .map_err(|e| BridgeError::StreamFailed(format!("header write failed: {}", e)))?;

        log::debug!("recording playback to {}", path.display());

        Ok(Box::new(WavStream {
            path,
            file: Some(file),
            format: config.format,
            data_bytes: 0,
            playing: false,
        }))
    }
}

struct WavStream {
    path: PathBuf,
    file: Option<File>,
    format: PcmFormat,
    data_bytes: u64,
    playing: bool,
}

impl WavStream {
    /// Rewrite the header with the current sizes and return to the end.
    fn patch_header(&mut self) -> Result<(), BridgeError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| BridgeError::StreamFailed("stream released".into()))?;

        let data_size = u32::try_from(self.data_bytes).unwrap_or(u32::MAX);
        let header = wav_header(&self.format, data_size);
        let io = |e: std::io::Error| BridgeError::StreamFailed(format!("header patch failed: {}", e));

        file.seek(SeekFrom::Start(0)).map_err(io)?;
        file.write_all(&header).map_err(io)?;
        file.seek(SeekFrom::End(0)).map_err(io)?;
        file.flush().map_err(io)
    }
}

impl PcmStream for WavStream {
    fn play(&mut self) -> Result<(), BridgeError> {
        self.playing = true;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, BridgeError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| BridgeError::StreamFailed("stream released".into()))?;
        file.write_all(data)
            .map_err(|e| BridgeError::StreamFailed(format!("write failed: {}", e)))?;
        self.data_bytes += data.len() as u64;
        Ok(data.len())
    }

    fn stop(&mut self) -> Result<(), BridgeError> {
        if self.playing {
            self.playing = false;
            self.patch_header()?;
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.file.is_none() {
            return;
        }
        if let Err(e) = self.patch_header() {
            log::warn!("{}: {}", self.path.display(), e);
        }
        self.file = None;
        log::debug!(
            "closed {} ({} bytes, {:.0} ms)",
            self.path.display(),
            self.data_bytes,
            self.format.duration_ms(self.data_bytes as usize)
        );
    }
}

impl Drop for WavStream {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use ptt_bridge_core::AudioSessionManager;

    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ptt-wav-test-{}", Uuid::new_v4()))
    }

    /// Recorded WAV files, smallest first.
    fn recordings(dir: &Path) -> Vec<Vec<u8>> {
        let mut files: Vec<Vec<u8>> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| fs::read(entry.unwrap().path()).unwrap())
            .collect();
        files.sort_by_key(|bytes| bytes.len());
        files
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    #[test]
    fn voice_header_fields() {
        let header = wav_header(&PcmFormat::VOICE, 1600);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..16], b"WAVEfmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16::from_le_bytes([header[22], header[23]]), 1);
        assert_eq!(u32_at(&header, 24), 8000);
        assert_eq!(u32_at(&header, 28), 16000);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 2);
        assert_eq!(u16::from_le_bytes([header[34], header[35]]), 16);
        assert_eq!(u32_at(&header, 40), 1600);
        assert_eq!(u32_at(&header, 4), 36 + 1600);
    }

    #[test]
    fn session_is_recorded_byte_exact() {
        let dir = scratch_dir();
        let mut manager = AudioSessionManager::new(WavFileOutput::new(&dir));

        manager.start_audio_track().unwrap();
        manager.write_audio(&[1, 2, 3]);
        manager.write_audio(&[4, 5]);
        manager.stop_audio_track();

        let recorded = recordings(&dir);
        assert_eq!(recorded.len(), 1);
        let bytes = &recorded[0];
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 5);
        assert_eq!(&bytes[WAV_HEADER_SIZE..], &[1, 2, 3, 4, 5]);
        assert_eq!(u32_at(&bytes, 40), 5);
        assert_eq!(u32_at(&bytes, 4), 36 + 5);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn restart_finalizes_previous_file() {
        let dir = scratch_dir();
        let mut manager = AudioSessionManager::new(WavFileOutput::new(&dir));

        manager.start_audio_track().unwrap();
        manager.write_audio(&[0; 320]);
        manager.start_audio_track().unwrap();
        manager.write_audio(&[0; 160]);
        drop(manager);

        let recorded = recordings(&dir);
        assert_eq!(recorded.len(), 2);
        assert_eq!(u32_at(&recorded[0], 40), 160);
        assert_eq!(u32_at(&recorded[1], 40), 320);
        assert_eq!(recorded[1].len(), WAV_HEADER_SIZE + 320);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn write_after_release_fails() {
        let dir = scratch_dir();
        let mut output = WavFileOutput::new(&dir);
        let config = StreamConfig::speech(PcmFormat::VOICE, 320, output.capabilities());
        let mut stream = output.open_stream(&config).unwrap();

        stream.play().unwrap();
        stream.release();
        stream.release();
        assert!(matches!(stream.write(&[0, 0]), Err(BridgeError::StreamFailed(_))));

        fs::remove_dir_all(&dir).unwrap();
    }
}
