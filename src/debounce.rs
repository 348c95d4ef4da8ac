use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

/// DebounceInput
///
/// Write side of a debouncer. Every `push` cancels the pending quiet-period
/// timer and starts a new one; only the value left standing once the period
/// elapses is committed.
#[derive(Debug, Clone)]
pub struct DebounceInput<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> DebounceInput<T> {
    /// Returns false once the debouncer has shut down.
    pub fn push(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// debounce
///
/// Spawns the debouncing task. Committed values arrive on the returned
/// receiver. Dropping every `DebounceInput` stops the task once the value
/// still waiting for its quiet period (if any) has been committed.
pub fn debounce<T: Send + 'static>(
    quiet: Duration,
) -> (DebounceInput<T>, mpsc::UnboundedReceiver<T>, JoinHandle<()>) {
    let (in_tx, mut in_rx) = mpsc::unbounded_channel::<T>();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<T>();

    let handle = tokio::spawn(async move {
        let mut pending: Option<T> = None;
        loop {
            if pending.is_none() {
                match in_rx.recv().await {
                    Some(value) => pending = Some(value),
                    None => break,
                }
                continue;
            }

            tokio::select! {
                next = in_rx.recv() => match next {
                    Some(value) => pending = Some(value),
                    None => {
                        // Closing the input is not a keystroke: the pending
                        // value still gets its quiet period, then commits.
                        tokio::time::sleep(quiet).await;
                        if let Some(value) = pending.take() {
                            let _ = out_tx.send(value);
                        }
                        break;
                    }
                },
                _ = tokio::time::sleep(quiet) => {
                    if let Some(value) = pending.take() {
                        if out_tx.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    (DebounceInput { tx: in_tx }, out_rx, handle)
}
