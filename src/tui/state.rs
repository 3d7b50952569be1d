use crate::analysis::result::AnalysisResult;
use crate::analysis::AnalysisError;
use crate::engine::session::{Session, SessionError, Stage, TriageBadge};
use crate::feed::types::Article;
use crate::publish::PublishTarget;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Instant;

/// Snapshot of the session published to the TUI after every engine step.
#[derive(Debug, Clone)]
pub struct AppState {
    pub start_time: Instant,
    pub stage: Stage,
    pub topic: Option<String>,
    pub articles: Vec<Article>,
    pub selected: Option<usize>,
    /// Active analysis and the link it belongs to.
    pub analysis: Option<(String, AnalysisResult)>,
    pub triage: HashMap<String, TriageBadge>,
    pub confirmation: Option<String>,
    pub model: String,
    pub auto_process: bool,
    pub default_targets: BTreeSet<PublishTarget>,
    pub has_credential: bool,
    /// Label of the in-flight network action, if any.
    pub busy: Option<String>,
    pub error: Option<ErrorNotice>,
    pub logs: VecDeque<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub message: String,
    /// Verbatim model output when extraction failed.
    pub raw: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

impl AppState {
    pub fn new(has_credential: bool) -> Self {
        Self {
            start_time: Instant::now(),
            stage: Stage::Idle,
            topic: None,
            articles: Vec::new(),
            selected: None,
            analysis: None,
            triage: HashMap::new(),
            confirmation: None,
            model: String::new(),
            auto_process: false,
            default_targets: BTreeSet::new(),
            has_credential,
            busy: None,
            error: None,
            logs: VecDeque::with_capacity(200),
        }
    }

    /// Copy the session's view fields. Logs, busy and error are untouched.
    pub fn sync(&mut self, session: &Session) {
        self.stage = session.stage();
        self.topic = session.topic().map(str::to_string);
        self.articles = session.articles().to_vec();
        self.selected = session.selected();
        self.analysis = session
            .analysis()
            .map(|(link, r)| (link.to_string(), r.clone()));
        self.triage = session.triage().clone();
        self.confirmation = session.confirmation().map(str::to_string);
        self.model = session.model().to_string();
        self.auto_process = session.auto_process();
        self.default_targets = session.default_targets().clone();
    }

    pub fn set_error(&mut self, context: &str, err: &SessionError) {
        let raw = match err {
            SessionError::Analysis(AnalysisError::Extraction(e)) => Some(e.raw().to_string()),
            _ => None,
        };
        let message = format!("{}: {}", context, err);
        self.push_log("ERROR", message.clone());
        self.error = Some(ErrorNotice { message, raw });
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= 200 {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}
