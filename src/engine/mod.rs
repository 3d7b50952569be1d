pub mod session;

use crate::analysis::{AnalysisError, Analyzer};
use crate::feed::NewsFeed;
use crate::publish::{EditableDraft, PublishDesk};
use crate::tui::state::AppState;
use session::{SelectPlan, Session, SessionError};
use tokio::sync::{mpsc, watch};

/// Operator actions, sent from the TUI to the dashboard engine.
#[derive(Debug, Clone)]
pub enum DashboardCommand {
    Fetch(String),
    Analyze(usize),
    Publish(EditableDraft),
    CycleModel,
    ToggleAutoProcess,
    Quit,
}

/// Single writer for the session. Runs one command to completion before the
/// next and mirrors the session into the watched `AppState` after each step.
pub struct Dashboard {
    session: Session,
    feed: Box<dyn NewsFeed>,
    analyzer: Analyzer,
    desk: PublishDesk,
    state_tx: watch::Sender<AppState>,
}

impl Dashboard {
    pub fn new(
        session: Session,
        feed: Box<dyn NewsFeed>,
        analyzer: Analyzer,
        desk: PublishDesk,
        state_tx: watch::Sender<AppState>,
    ) -> Self {
        let dashboard = Self {
            session,
            feed,
            analyzer,
            desk,
            state_tx,
        };
        dashboard.sync();
        dashboard
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<DashboardCommand>) {
        while let Some(cmd) = cmd_rx.recv().await {
            if !self.handle(cmd).await {
                break;
            }
        }
        tracing::debug!("dashboard engine stopped");
    }

    /// Apply one command. Returns false when the engine should stop.
    pub async fn handle(&mut self, cmd: DashboardCommand) -> bool {
        match cmd {
            DashboardCommand::Fetch(topic) => self.fetch(&topic).await,
            DashboardCommand::Analyze(index) => self.analyze(index).await,
            DashboardCommand::Publish(draft) => self.publish(&draft).await,
            DashboardCommand::CycleModel => {
                let model = self.session.cycle_model().to_string();
                self.log("INFO", format!("Model set to {}", model));
            }
            DashboardCommand::ToggleAutoProcess => {
                let on = self.session.toggle_auto_process();
                self.log("INFO", format!("Auto-process {}", if on { "enabled" } else { "disabled" }));
            }
            DashboardCommand::Quit => return false,
        }
        self.sync();
        true
    }

    async fn fetch(&mut self, topic: &str) {
        self.begin(format!("Fetching \"{}\"", topic.trim()));
        let outcome = self.session.fetch(self.feed.as_mut(), topic).await;
        self.end();

        match outcome {
            Ok(count) => {
                self.log("INFO", format!("Fetched {} articles for \"{}\"", count, topic.trim()));
                if self.session.auto_process() && count > 0 {
                    self.triage_all().await;
                }
            }
            Err(e) => self.fail("Fetch failed", &e),
        }
    }

    /// Auto-process: analyze every fetched article for its badge. Never
    /// touches the active analysis.
    async fn triage_all(&mut self) {
        let articles = self.session.articles().to_vec();
        let total = articles.len();
        for (i, article) in articles.iter().enumerate() {
            self.begin(format!("Auto-processing {}/{}", i + 1, total));
            let outcome = self.analyzer.analyze(article, self.session.model()).await;
            match outcome {
                Ok(result) => self.session.record_triage(&article.link, &result),
                Err(e) => {
                    tracing::warn!(link = %article.link, error = %e, "triage failed");
                    self.log("WARN", format!("Auto-process skipped \"{}\": {}", article.title, e));
                    if matches!(e, AnalysisError::MissingCredential) {
                        break;
                    }
                }
            }
        }
        self.end();
    }

    async fn analyze(&mut self, index: usize) {
        let plan = match self.session.begin_select(index) {
            Ok(plan) => plan,
            Err(e) => return self.fail("Analyze failed", &e),
        };

        let article = match plan {
            SelectPlan::Cached => {
                self.clear_error();
                tracing::debug!(index, "analysis cache hit");
                return;
            }
            SelectPlan::Analyze(article) => article,
        };

        self.begin("AI is gazing into the data...".to_string());
        let outcome = self.analyzer.analyze(&article, self.session.model()).await;
        let completed = self.session.complete_analysis(&article.link, outcome);
        self.end();

        match completed {
            Ok(()) => self.log("INFO", format!("Analyzed \"{}\"", article.title)),
            Err(e) => self.fail("Analysis failed", &e),
        }
    }

    async fn publish(&mut self, draft: &EditableDraft) {
        match self.session.submit(draft, &self.desk).await {
            Ok(confirmation) => {
                self.clear_error();
                self.log("INFO", confirmation);
            }
            Err(e) => self.fail("Publish failed", &e),
        }
    }

    /// Mark a network call in flight and drop the previous error, in one update.
    fn begin(&self, label: String) {
        self.state_tx.send_modify(|s| {
            s.sync(&self.session);
            s.error = None;
            s.busy = Some(label);
        });
    }

    fn end(&self) {
        self.state_tx.send_modify(|s| s.busy = None);
    }

    fn sync(&self) {
        self.state_tx.send_modify(|s| s.sync(&self.session));
    }

    fn log(&self, level: &str, message: String) {
        self.state_tx.send_modify(|s| s.push_log(level, message));
    }

    fn clear_error(&self) {
        self.state_tx.send_modify(|s| s.error = None);
    }

    fn fail(&self, context: &str, err: &SessionError) {
        tracing::warn!(error = %err, "{}", context);
        self.state_tx.send_modify(|s| s.set_error(context, err));
    }
}
