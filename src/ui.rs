//! TUI module using ratatui.
//!
//! Component-based pattern: [`App`] owns the [`ReaderState`] on the event
//! loop, network work runs in spawned tasks and reports back over a channel.

pub mod components;

use crate::backend::BackendClient;
use crate::catalog::{BookSummaryRef, CatalogClient, CatalogError};
use crate::config::Config;
use crate::export;
use crate::reader::{run_summary, ClientError, SummarizeError, SummarizeRequest, SummarySource};
use crate::state::{ReaderState, RequestToken};
use crate::summary::SummarizeResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::ListState;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const TICK: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum UiError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Panel receiving keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Results,
    Upload,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Search => Focus::Results,
            Focus::Results => Focus::Upload,
            Focus::Upload => Focus::Search,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Search => Focus::Upload,
            Focus::Results => Focus::Search,
            Focus::Upload => Focus::Results,
        }
    }
}

/// Finished network work, applied on the event loop
enum Outcome {
    Search(RequestToken, Result<Vec<BookSummaryRef>, CatalogError>),
    Summary {
        token: RequestToken,
        failure_text: &'static str,
        result: Result<SummarizeResult, SummarizeError>,
    },
}

pub struct App {
    state: ReaderState,
    config: Config,
    focus: Focus,
    list: ListState,
    upload_input: String,
    status: Option<String>,
    searching: bool,
    catalog: CatalogClient,
    backend: BackendClient,
    player: Option<Child>,
    tx: UnboundedSender<Outcome>,
    rx: UnboundedReceiver<Outcome>,
    should_quit: bool,
}

/// Launch the TUI and block until the user quits
pub async fn run(config: Config) -> Result<(), UiError> {
    let mut app = App::new(config)?;
    let mut terminal = ratatui::try_init()?;
    let result = app.run(&mut terminal).await;
    ratatui::restore();
    app.stop_player();
    result
}

impl App {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let catalog = CatalogClient::new(&config.catalog, &config.backend)?;
        let backend = BackendClient::new(&config.backend)?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            state: ReaderState::new(config.language),
            config,
            focus: Focus::Search,
            list: ListState::default(),
            upload_input: String::new(),
            status: None,
            searching: false,
            catalog,
            backend,
            player: None,
            tx,
            rx,
            should_quit: false,
        })
    }

    async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<(), UiError> {
        loop {
            self.drain_outcomes();

            terminal.draw(|frame| components::render(frame, self))?;

            if self.should_quit {
                break;
            }

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            } else {
                // Let spawned requests make progress on this worker too
                tokio::task::yield_now().await;
            }
        }

        Ok(())
    }

    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Search(token, result) => {
                let failed = result.is_err();
                if self.state.finish_search(token, result) {
                    self.searching = false;
                    let found = self.state.results().len();
                    self.list.select((found > 0).then_some(0));
                    self.status = if failed {
                        None
                    } else {
                        Some(format!("{found} books found"))
                    };
                }
            }
            Outcome::Summary {
                token,
                failure_text,
                result,
            } => {
                self.state.finish_summary(token, result, failure_text);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('s') if ctrl => self.save_summary(),
            KeyCode::Char('a') if ctrl => self.save_audio(),
            KeyCode::Char('p') if ctrl => self.play_audio(),
            KeyCode::F(2) => self.state.language = self.state.language.next(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            code => match self.focus {
                Focus::Search => self.on_search_key(code),
                Focus::Results => self.on_results_key(code),
                Focus::Upload => self.on_upload_key(code),
            },
        }
    }

    fn on_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.state.query.push(c),
            KeyCode::Backspace => {
                self.state.query.pop();
            }
            KeyCode::Enter => self.start_search(),
            _ => {}
        }
    }

    fn on_results_key(&mut self, code: KeyCode) {
        let count = self.state.results().len();
        if count == 0 {
            return;
        }

        match code {
            KeyCode::Down | KeyCode::Char('j') => {
                let next = self.list.selected().map_or(0, |i| (i + 1).min(count - 1));
                self.list.select(Some(next));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let prev = self.list.selected().map_or(0, |i| i.saturating_sub(1));
                self.list.select(Some(prev));
            }
            KeyCode::Enter => {
                if let Some(book) = self.list.selected().and_then(|i| self.state.results().get(i)) {
                    let key = book.key.clone();
                    self.start_summary(SummarySource::Book { key });
                }
            }
            _ => {}
        }
    }

    fn on_upload_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.upload_input.push(c),
            KeyCode::Backspace => {
                self.upload_input.pop();
            }
            KeyCode::Enter => {
                let path = self.upload_input.trim();
                self.state.upload = (!path.is_empty()).then(|| PathBuf::from(path));
                if let Some(path) = self.state.upload.clone() {
                    self.start_summary(SummarySource::Upload(path));
                }
            }
            _ => {}
        }
    }

    fn start_search(&mut self) {
        let Some((token, query)) = self.state.begin_search() else {
            return;
        };
        self.searching = true;
        self.status = Some(format!("Searching for \"{query}\"..."));

        let catalog = self.catalog.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = catalog.search(&query).await;
            let _ = tx.send(Outcome::Search(token, result));
        });
    }

    fn start_summary(&mut self, source: SummarySource) {
        // The summarise controls are disabled while a request is in flight
        if self.state.is_loading() {
            return;
        }

        self.stop_player();
        self.status = None;

        let failure_text = source.failure_text();
        let request = SummarizeRequest {
            source,
            language: self.state.language,
        };
        let token = self.state.begin_summary();

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = run_summary(&backend, request).await;
            let _ = tx.send(Outcome::Summary {
                token,
                failure_text,
                result,
            });
        });
    }

    fn save_summary(&mut self) {
        let saved = export::save_summary(&self.config.export.dir, self.state.summary());
        self.report_export(saved);
    }

    fn save_audio(&mut self) {
        let saved = export::save_audio(&self.config.export.dir, self.state.audio());
        self.report_export(saved);
    }

    fn report_export(&mut self, saved: Result<Option<PathBuf>, export::ExportError>) {
        match saved {
            Ok(Some(path)) => self.status = Some(format!("Saved {}", path.display())),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.status = Some(format!("Export failed: {e}"));
            }
        }
    }

    fn play_audio(&mut self) {
        let Some(player) = self.config.audio.player.clone() else {
            if self.state.audio().is_some() {
                self.status = Some("Set [audio] player in lumireads.toml to play narration".into());
            }
            return;
        };
        let Some(audio) = self.state.audio_mut() else {
            return;
        };

        match audio.play(&player) {
            Ok(child) => {
                self.stop_player();
                self.player = Some(child);
                self.status = Some("Playing narration".into());
            }
            Err(e) => {
                tracing::warn!(error = %e, player = %player, "failed to start audio player");
                self.status = Some(format!("Could not start {player}: {e}"));
            }
        }
    }

    /// Stop and reap the running player, if any
    fn stop_player(&mut self) {
        if let Some(mut child) = self.player.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
