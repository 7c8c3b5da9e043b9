use crate::browser::command::{AsyncCommandRunner, Command, Message, Services};
use crate::browser::state::Browser;
use crate::core::launch::Handoff;
use crate::core::sources::EditorLauncher;
use crate::modes::watch::{watch_notebook, NotebookWatcher};
use crate::tui::{key_id, render, truncate_to_width, viewport_rows};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;

const INPUT_POLL: Duration = Duration::from_millis(50);

struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut impl Write) -> Result<Self, String> {
        terminal::enable_raw_mode().map_err(|err| err.to_string())?;
        stdout
            .execute(EnterAlternateScreen)
            .map_err(|err| err.to_string())?;
        stdout.execute(Hide).map_err(|err| err.to_string())?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = stdout.execute(Show);
    }
}

/// Collaborators the event loop runs itself.
pub struct Foreground {
    pub editor: Box<dyn EditorLauncher>,
    pub handoff: Option<Handoff>,
    /// Directory to watch for changes made outside the browser.
    pub watch_dir: Option<PathBuf>,
}

fn draw(browser: &mut Browser, stdout: &mut impl Write) -> Result<(), String> {
    let (width, height) = terminal::size().map_err(|err| err.to_string())?;
    let width = width.max(1) as usize;
    let height = height.max(1) as usize;

    browser.set_viewport(viewport_rows(browser, height));
    let lines = render(browser, width, height);

    stdout
        .execute(MoveTo(0, 0))
        .map_err(|err| err.to_string())?;
    stdout
        .execute(Clear(ClearType::All))
        .map_err(|err| err.to_string())?;

    for (index, line) in lines.iter().enumerate() {
        let truncated = truncate_to_width(line, width);
        if index + 1 == lines.len() {
            write!(stdout, "{truncated}").map_err(|err| err.to_string())?;
        } else {
            write!(stdout, "{truncated}\r\n").map_err(|err| err.to_string())?;
        }
    }
    stdout.flush().map_err(|err| err.to_string())?;
    Ok(())
}

/// Runs the browser until the user quits. Background commands go to worker
/// threads; the editor, hand-off writes and quitting happen here.
pub fn run_browser(
    mut browser: Browser,
    services: Services,
    foreground: Foreground,
) -> Result<(), String> {
    let (tx, rx) = mpsc::channel();
    let runner = AsyncCommandRunner::new(services, tx.clone());
    let _watcher = foreground
        .watch_dir
        .as_deref()
        .and_then(|dir| start_watcher(dir, tx.clone()));

    let mut stdout = io::stdout();
    let mut guard = Some(TerminalGuard::enter(&mut stdout)?);
    let mut queue: VecDeque<Command> = browser.start().into();
    let mut dirty = true;

    loop {
        while let Some(command) = queue.pop_front() {
            match command {
                Command::Quit => {
                    tracing::info!("quitting");
                    return Ok(());
                }
                Command::OpenEditor { path } => {
                    tracing::info!(path = %path.display(), "opening editor");
                    guard.take();
                    let result = foreground
                        .editor
                        .open(&path)
                        .map_err(|err| err.to_string());
                    guard = Some(TerminalGuard::enter(&mut stdout)?);
                    queue.extend(browser.on_message(Message::EditorClosed { result }));
                }
                Command::Handoff { path, kind } => match &foreground.handoff {
                    Some(handoff) => {
                        if let Err(err) = handoff.write(kind, &path) {
                            browser.set_error(err.to_string());
                            queue.retain(|queued| *queued != Command::Quit);
                        }
                    }
                    None => queue.push_front(Command::OpenEditor { path }),
                },
                other => runner.spawn(other),
            }
            dirty = true;
        }

        if dirty {
            draw(&mut browser, &mut stdout)?;
            dirty = false;
        }

        if event::poll(INPUT_POLL).map_err(|err| err.to_string())? {
            match event::read().map_err(|err| err.to_string())? {
                Event::Key(key) => {
                    if let Some(id) = key_id(&key) {
                        queue.extend(browser.handle_key(&id));
                        dirty = true;
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        while let Ok(message) = rx.try_recv() {
            queue.extend(browser.on_message(message));
            dirty = true;
        }
    }
}

fn start_watcher(dir: &Path, tx: mpsc::Sender<Message>) -> Option<NotebookWatcher> {
    match watch_notebook(dir, tx) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(dir = %dir.display(), "not watching notebook: {err}");
            None
        }
    }
}
