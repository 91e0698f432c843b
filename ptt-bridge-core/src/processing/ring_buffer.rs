use parking_lot::{Condvar, Mutex};

/// Circular buffer of 16-bit PCM samples.
///
/// Unlike a lossy meter buffer, a full ring refuses new samples instead of
/// dropping old ones: playback data must never be silently discarded.
#[derive(Debug)]
pub struct SampleRing {
    buffer: Vec<i16>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Write as many of `samples` as fit. Returns the number written.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let to_write = samples.len().min(self.free());
        for &sample in &samples[..to_write] {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += to_write;
        to_write
    }

    /// Move up to `out.len()` samples into `out`. Returns the number read.
    pub fn read_into(&mut self, out: &mut [i16]) -> usize {
        let to_read = out.len().min(self.available);
        for slot in out.iter_mut().take(to_read) {
            *slot = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % self.capacity;
        }
        self.available -= to_read;
        to_read
    }

    /// Number of samples currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn free(&self) -> usize {
        self.capacity - self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn is_full(&self) -> bool {
        self.available == self.capacity
    }

    /// Reset the buffer to empty state.
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct QueueState {
    ring: SampleRing,
    closed: bool,
}

/// Thread-safe sample queue between a writer thread and a device callback.
///
/// `push` blocks while the ring is full, which is how device backpressure
/// reaches the caller of `writeAudio`. `pull` never blocks; the device
/// callback plays silence for whatever it cannot fill.
pub struct PcmQueue {
    state: Mutex<QueueState>,
    space_available: Condvar,
}

impl PcmQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                ring: SampleRing::new(capacity),
                closed: false,
            }),
            space_available: Condvar::new(),
        }
    }

    /// Queue every sample, waiting for space as needed.
    ///
    /// Returns the number of samples queued, which is short only if the
    /// queue was closed while waiting.
    pub fn push(&self, mut samples: &[i16]) -> usize {
        let mut queued = 0;
        let mut state = self.state.lock();
        while !samples.is_empty() {
            if state.closed {
                break;
            }
            let written = state.ring.write(samples);
            queued += written;
            samples = &samples[written..];
            if !samples.is_empty() {
                self.space_available.wait(&mut state);
            }
        }
        queued
    }

    /// Fill `out` from the queue, padding the remainder with silence.
    ///
    /// Returns the number of real samples copied.
    pub fn pull(&self, out: &mut [i16]) -> usize {
        let read = {
            let mut state = self.state.lock();
            state.ring.read_into(out)
        };
        out[read..].fill(0);
        if read > 0 {
            self.space_available.notify_all();
        }
        read
    }

    /// Drop queued samples without closing.
    pub fn clear(&self) {
        self.state.lock().ring.reset();
        self.space_available.notify_all();
    }

    /// Wake any blocked writer and refuse further samples.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.space_available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn queued(&self) -> usize {
        self.state.lock().ring.count()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }
}
