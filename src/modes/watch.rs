use crate::browser::command::Message;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(100);
const POLL: Duration = Duration::from_millis(50);

/// Watches the notebook directory and posts [`Message::ExternalChange`] once
/// a burst of file events has settled. Watching stops when this is dropped.
pub struct NotebookWatcher {
    _watcher: RecommendedWatcher,
    stop_tx: mpsc::Sender<()>,
}

impl Drop for NotebookWatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

pub fn watch_notebook(dir: &Path, tx: Sender<Message>) -> Result<NotebookWatcher, notify::Error> {
    let (event_tx, event_rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            let _ = event_tx.send(event);
        }
    })?;
    watcher.watch(dir, RecursiveMode::Recursive)?;
    tracing::debug!(dir = %dir.display(), "watching notebook");

    let (stop_tx, stop_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut dirty_since: Option<Instant> = None;
        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }
            match event_rx.recv_timeout(POLL) {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Create(_)
                    ) {
                        dirty_since = Some(Instant::now());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if dirty_since.is_some_and(|since| since.elapsed() >= DEBOUNCE) {
                dirty_since = None;
                if tx.send(Message::ExternalChange).is_err() {
                    break;
                }
            }
        }
    });

    Ok(NotebookWatcher {
        _watcher: watcher,
        stop_tx,
    })
}
