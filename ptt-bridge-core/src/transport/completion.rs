use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

/// Callback receiving the boolean result of a transport command.
pub type ResultCallback = Box<dyn FnOnce(bool) + Send + 'static>;

struct Slot {
    callback: Option<ResultCallback>,
    claimed: bool,
}

struct CompletionInner {
    operation: &'static str,
    slot: Mutex<Slot>,
}

impl Drop for CompletionInner {
    fn drop(&mut self) {
        if let Some(callback) = self.slot.get_mut().callback.take() {
            log::debug!("{}: abandoned before resolving, answering false", self.operation);
            callback(false);
        }
    }
}

/// A pending transport result that resolves exactly once.
///
/// Clones share the same slot. The first `resolve` wins; later ones are
/// ignored. If every clone is dropped unresolved, the callback gets `false`.
///
/// A completion can be `claim`ed by the party that will produce the result.
/// Once claimed, `expire` no longer resolves it.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<CompletionInner>,
}

impl Completion {
    pub fn new(operation: &'static str, callback: ResultCallback) -> Self {
        Self {
            inner: Arc::new(CompletionInner {
                operation,
                slot: Mutex::new(Slot {
                    callback: Some(callback),
                    claimed: false,
                }),
            }),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.inner.operation
    }

    /// Deliver `value` if nothing has been delivered yet.
    ///
    /// Returns `true` if this call delivered the result.
    pub fn resolve(&self, value: bool) -> bool {
        let callback = self.inner.slot.lock().callback.take();
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    /// Reserve the result for the caller. Fails if it was already claimed
    /// or resolved.
    pub fn claim(&self) -> bool {
        let mut slot = self.inner.slot.lock();
        if slot.callback.is_none() || slot.claimed {
            return false;
        }
        slot.claimed = true;
        true
    }

    /// Answer `false` unless the result was claimed or already delivered.
    pub fn expire(&self) -> bool {
        let callback = {
            let mut slot = self.inner.slot.lock();
            if slot.claimed {
                None
            } else {
                slot.callback.take()
            }
        };
        match callback {
            Some(callback) => {
                callback(false);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.slot.lock().callback.is_none()
    }
}

/// Watchdog that answers `false` if a bind takes longer than its timeout.
///
/// Dropping the `Deadline` disarms it. A claimed completion is left alone
/// even if the timeout passes first.
pub struct Deadline {
    _cancel: mpsc::Sender<()>,
}

impl Deadline {
    pub fn arm(timeout: Duration, completion: Completion) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("profile-bind-deadline".into())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(timeout) {
                    if completion.expire() {
                        log::warn!(
                            "{}: no profile proxy after {:?}, answering false",
                            completion.operation(),
                            timeout
                        );
                    }
                }
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn bind deadline thread: {}", e);
        }

        Self { _cancel: cancel }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;

    use super::*;

    fn recorder() -> (ResultCallback, mpsc::Receiver<bool>) {
        let (tx, rx) = channel();
        let callback: ResultCallback = Box::new(move |value| {
            let _ = tx.send(value);
        });
        (callback, rx)
    }

    #[test]
    fn first_resolve_wins() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);
        let other = completion.clone();

        assert!(completion.resolve(true));
        assert!(!other.resolve(false));
        assert!(other.is_resolved());
        drop(completion);
        drop(other);

        assert_eq!(rx.recv().unwrap(), true);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropping_unresolved_answers_false() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);
        let clone = completion.clone();
        drop(completion);
        assert!(rx.try_recv().is_err());
        drop(clone);

        assert_eq!(rx.recv().unwrap(), false);
    }

    #[test]
    fn deadline_fires_when_nothing_arrives() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);
        let _deadline = Deadline::arm(Duration::from_millis(20), completion.clone());

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), false);
        assert!(completion.is_resolved());
    }

    #[test]
    fn disarmed_deadline_stays_quiet() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);
        let deadline = Deadline::arm(Duration::from_millis(50), completion.clone());
        drop(deadline);

        thread::sleep(Duration::from_millis(100));
        assert!(!completion.is_resolved());
        assert!(completion.resolve(true));
        assert_eq!(rx.recv().unwrap(), true);
    }

    #[test]
    fn claimed_completion_outlives_deadline() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);
        let _deadline = Deadline::arm(Duration::from_millis(20), completion.clone());

        assert!(completion.claim());
        assert!(!completion.claim());
        thread::sleep(Duration::from_millis(80));
        assert!(rx.try_recv().is_err());
        assert!(!completion.is_resolved());

        assert!(completion.resolve(true));
        assert_eq!(rx.recv().unwrap(), true);
    }

    #[test]
    fn expired_completion_cannot_be_claimed() {
        let (callback, rx) = recorder();
        let completion = Completion::new("test", callback);

        assert!(completion.expire());
        assert!(!completion.claim());
        assert!(!completion.expire());
        assert_eq!(rx.recv().unwrap(), false);
    }
}
