pub mod render;
pub mod state;

use crate::analysis::result::AnalysisResult;
use crate::engine::session::Stage;
use crate::engine::DashboardCommand;
use crate::publish::{EditableDraft, PublishTarget};
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::AppState;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Topic,
    Feed,
    Blog,
    Social,
    Targets,
}

/// Input state owned by the TUI: the search field, feed cursor and the
/// publish form. The form is reseeded whenever a different analysis
/// becomes active.
#[derive(Debug, Clone)]
pub struct Ui {
    pub focus: Focus,
    pub topic: String,
    pub cursor: usize,
    pub form: Option<EditableDraft>,
    pub target_cursor: usize,
    pub spinner_frame: u8,
    /// First visible line of the raw model output pane.
    pub raw_scroll: u16,
    form_seed: Option<(String, AnalysisResult)>,
    raw_seed: Option<String>,
    /// The form was submitted; drop it once the engine reports Published.
    submitted: bool,
    /// A command was sent and the engine has not answered yet.
    awaiting: bool,
}

impl Ui {
    pub fn new(default_topic: String) -> Self {
        Self {
            focus: Focus::Topic,
            topic: default_topic,
            cursor: 0,
            form: None,
            target_cursor: 0,
            spinner_frame: 0,
            raw_scroll: 0,
            form_seed: None,
            raw_seed: None,
            submitted: false,
            awaiting: false,
        }
    }

    /// Reconcile with the latest engine snapshot.
    pub fn refresh(&mut self, state: &AppState) {
        if self.cursor >= state.articles.len() {
            self.cursor = state.articles.len().saturating_sub(1);
        }

        let published = self.submitted && state.stage == Stage::Published;
        if published {
            self.submitted = false;
        }

        if state.analysis != self.form_seed || published {
            self.form = state.analysis.as_ref().map(|(_, r)| EditableDraft {
                blog: r.blog_draft().to_string(),
                social: r.social_draft().to_string(),
                targets: state.default_targets.clone(),
            });
            self.form_seed = state.analysis.clone();
        }

        let raw = state.error.as_ref().and_then(|e| e.raw.clone());
        if raw != self.raw_seed {
            self.raw_scroll = 0;
            self.raw_seed = raw;
        }

        if self.form.is_none() && matches!(self.focus, Focus::Blog | Focus::Social | Focus::Targets) {
            self.focus = Focus::Feed;
        }
    }

    fn blocked(&self, state: &AppState) -> bool {
        self.awaiting || state.busy.is_some()
    }

    fn focus_order(&self) -> Vec<Focus> {
        if self.form.is_some() {
            vec![Focus::Topic, Focus::Feed, Focus::Blog, Focus::Social, Focus::Targets]
        } else {
            vec![Focus::Topic, Focus::Feed]
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % order.len()
        } else {
            (pos + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Map a key press to a command for the engine, if any.
    pub fn handle_key(&mut self, state: &AppState, key: KeyEvent) -> Option<DashboardCommand> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            return Some(DashboardCommand::Quit);
        }
        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(true);
                return None;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return None;
            }
            KeyCode::Esc => {
                self.focus = Focus::Feed;
                return None;
            }
            KeyCode::PageDown => {
                let max = self.raw_seed.as_deref().map_or(0, |r| r.lines().count().saturating_sub(1));
                self.raw_scroll = (self.raw_scroll as usize + 5).min(max) as u16;
                return None;
            }
            KeyCode::PageUp => {
                self.raw_scroll = self.raw_scroll.saturating_sub(5);
                return None;
            }
            _ => {}
        }
        if ctrl && key.code == KeyCode::Char('p') {
            return self.submit(state);
        }

        match self.focus {
            Focus::Topic => self.topic_key(state, key),
            Focus::Feed => self.feed_key(state, key),
            Focus::Blog | Focus::Social => {
                self.edit_key(key);
                None
            }
            Focus::Targets => {
                self.targets_key(key);
                None
            }
        }
    }

    fn topic_key(&mut self, state: &AppState, key: KeyEvent) -> Option<DashboardCommand> {
        match key.code {
            KeyCode::Char(c) => self.topic.push(c),
            KeyCode::Backspace => {
                self.topic.pop();
            }
            KeyCode::Enter => {
                let topic = self.topic.trim().to_string();
                if topic.is_empty() || self.blocked(state) {
                    return None;
                }
                self.focus = Focus::Feed;
                self.cursor = 0;
                return self.send(DashboardCommand::Fetch(topic));
            }
            _ => {}
        }
        None
    }

    fn feed_key(&mut self, state: &AppState, key: KeyEvent) -> Option<DashboardCommand> {
        match key.code {
            KeyCode::Char('q') => return Some(DashboardCommand::Quit),
            KeyCode::Char('/') => self.focus = Focus::Topic,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < state.articles.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => self.cursor = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.cursor = state.articles.len().saturating_sub(1);
            }
            KeyCode::Char('a') | KeyCode::Enter => {
                if state.articles.is_empty() || self.blocked(state) {
                    return None;
                }
                return self.send(DashboardCommand::Analyze(self.cursor));
            }
            KeyCode::Char('e') => {
                if self.form.is_some() {
                    self.focus = Focus::Blog;
                }
            }
            KeyCode::Char('m') if !self.blocked(state) => {
                return self.send(DashboardCommand::CycleModel);
            }
            KeyCode::Char('t') if !self.blocked(state) => {
                return self.send(DashboardCommand::ToggleAutoProcess);
            }
            _ => {}
        }
        None
    }

    fn edit_key(&mut self, key: KeyEvent) {
        let focus = self.focus;
        let Some(form) = self.form.as_mut() else { return };
        let buf = if focus == Focus::Blog { &mut form.blog } else { &mut form.social };
        match key.code {
            KeyCode::Char(c) => buf.push(c),
            KeyCode::Enter => buf.push('\n'),
            KeyCode::Backspace => {
                buf.pop();
            }
            _ => {}
        }
    }

    fn targets_key(&mut self, key: KeyEvent) {
        let last = PublishTarget::ALL.len() - 1;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.target_cursor = (self.target_cursor + 1).min(last),
            KeyCode::Char('k') | KeyCode::Up => self.target_cursor = self.target_cursor.saturating_sub(1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(form) = self.form.as_mut() {
                    form.toggle_target(PublishTarget::ALL[self.target_cursor]);
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self, state: &AppState) -> Option<DashboardCommand> {
        if self.blocked(state) {
            return None;
        }
        let draft = self.form.clone()?;
        self.submitted = true;
        self.send(DashboardCommand::Publish(draft))
    }

    fn send(&mut self, cmd: DashboardCommand) -> Option<DashboardCommand> {
        self.awaiting = true;
        Some(cmd)
    }
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<DashboardCommand>,
    default_topic: String,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx, Ui::new(default_topic)).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<DashboardCommand>,
    mut ui: Ui,
) -> Result<()> {
    let mut events = EventStream::new();
    // Spinner cadence
    let mut tick = tokio::time::interval(Duration::from_millis(100));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let state = state_rx.borrow().clone();
        ui.refresh(&state);
        terminal.draw(|f| render::draw(f, &state, &ui))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(cmd) = ui.handle_key(&state, key) {
                        let quit = matches!(cmd, DashboardCommand::Quit);
                        if let Err(e) = cmd_tx.try_send(cmd) {
                            tracing::warn!(error = %e, "dropped dashboard command");
                            ui.awaiting = false;
                        }
                        if quit {
                            return Ok(());
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                ui.awaiting = false;
            }
            _ = tick.tick() => {
                ui.spinner_frame = ui.spinner_frame.wrapping_add(1);
            }
        }
    }
}
