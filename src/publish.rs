use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PublishTarget {
    WordPress,
    TwitterX,
    LinkedIn,
}

impl PublishTarget {
    pub const ALL: [PublishTarget; 3] = [
        PublishTarget::WordPress,
        PublishTarget::TwitterX,
        PublishTarget::LinkedIn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PublishTarget::WordPress => "WordPress",
            PublishTarget::TwitterX => "Twitter/X",
            PublishTarget::LinkedIn => "LinkedIn",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.label().eq_ignore_ascii_case(label))
    }

    /// The draft body this platform receives.
    fn body(self, draft: &EditableDraft) -> &str {
        match self {
            PublishTarget::WordPress => &draft.blog,
            PublishTarget::TwitterX | PublishTarget::LinkedIn => &draft.social,
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator-edited copy of the drafts plus the chosen targets. Lives only
/// for one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditableDraft {
    pub blog: String,
    pub social: String,
    pub targets: BTreeSet<PublishTarget>,
}

impl EditableDraft {
    pub fn toggle_target(&mut self, target: PublishTarget) {
        if !self.targets.remove(&target) {
            self.targets.insert(target);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub target: PublishTarget,
    pub chars: usize,
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{target}: {message}")]
    Rejected { target: PublishTarget, message: String },
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn target(&self) -> PublishTarget;
    async fn publish(&self, draft: &EditableDraft) -> Result<PublishReceipt, PublishError>;
}

/// Logs what would be sent and contacts nothing.
pub struct DryRunPublisher {
    target: PublishTarget,
}

impl DryRunPublisher {
    pub fn new(target: PublishTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn target(&self) -> PublishTarget {
        self.target
    }

    async fn publish(&self, draft: &EditableDraft) -> Result<PublishReceipt, PublishError> {
        let body = self.target.body(draft);
        tracing::info!(
            target_platform = %self.target,
            chars = body.chars().count(),
            "DRY RUN: would publish draft"
        );
        Ok(PublishReceipt {
            target: self.target,
            chars: body.chars().count(),
            dry_run: true,
        })
    }
}

/// Outcome of one submission across all selected targets.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub receipts: Vec<PublishReceipt>,
    pub failures: Vec<PublishError>,
}

impl PublishReport {
    /// Confirmation line shown to the operator.
    pub fn confirmation(&self) -> String {
        if self.receipts.is_empty() && self.failures.is_empty() {
            return "Approved. No publish targets selected.".to_string();
        }
        let mut msg = String::new();
        if !self.receipts.is_empty() {
            let names: Vec<&str> = self.receipts.iter().map(|r| r.target.label()).collect();
            msg.push_str(&format!("Published successfully to {}!", names.join(", ")));
        }
        for failure in &self.failures {
            if !msg.is_empty() {
                msg.push(' ');
            }
            msg.push_str(&format!("Failed: {}.", failure));
        }
        msg
    }
}

/// Fans a draft out to the publishers of the selected targets.
pub struct PublishDesk {
    publishers: Vec<Box<dyn Publisher>>,
}

impl PublishDesk {
    pub fn new(publishers: Vec<Box<dyn Publisher>>) -> Self {
        Self { publishers }
    }

    /// One dry-run publisher for every known target.
    pub fn dry_run() -> Self {
        Self::new(
            PublishTarget::ALL
                .into_iter()
                .map(|t| Box::new(DryRunPublisher::new(t)) as Box<dyn Publisher>)
                .collect(),
        )
    }

    pub async fn publish(&self, draft: &EditableDraft) -> PublishReport {
        let mut report = PublishReport::default();
        for target in &draft.targets {
            let Some(publisher) = self.publishers.iter().find(|p| p.target() == *target) else {
                report.failures.push(PublishError::Rejected {
                    target: *target,
                    message: "no publisher configured".to_string(),
                });
                continue;
            };
            match publisher.publish(draft).await {
                Ok(receipt) => report.receipts.push(receipt),
                Err(e) => {
                    tracing::warn!(error = %e, "publish failed");
                    report.failures.push(e);
                }
            }
        }
        report
    }
}
