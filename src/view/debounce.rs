use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// Emits a value only after it stopped changing for `delay`.
///
/// Every [`Debouncer::schedule`] aborts the pending countdown, so only the last
/// value of a burst reaches subscribers. Must be used inside a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    output: watch::Sender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (output, _) = watch::channel(initial);
        Self { delay, output, pending: None }
    }

    /// Current (settled) value
    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    /// Restart the countdown with `value`
    pub fn schedule(&mut self, value: T) {
        self.cancel();
        trace!(?value, delay_ms = self.delay.as_millis() as u64, "Debounce scheduled");
        let output = self.output.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&output, value);
        }));
    }

    /// Drop the pending countdown and emit `value` right away
    pub fn flush(&mut self, value: T) {
        self.cancel();
        publish(&self.output, value);
    }

    /// Drop the pending countdown. Returns `true` if one was still running.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

fn publish<T: PartialEq + std::fmt::Debug>(output: &watch::Sender<T>, value: T) {
    output.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        trace!(?value, "Debounced value emitted");
        *current = value;
        true
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
