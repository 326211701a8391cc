//! Auto-approval rule for code access requests.
//!
//! Pending requests whose `auto_approve_at` deadline has passed are
//! transitioned to approved, with a notification to the requester, one
//! to the admins, and an activity entry per approval. The transition is
//! guarded by a conditional UPDATE so a request is approved at most
//! once even when a run overlaps an explicit admin review. Side effects
//! are best-effort: a committed transition stands even when a
//! notification write fails, and the failure lands in the run's error
//! list instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::{self, ApproveRequest, CreateActivity, CreateNotification, DbPool, RecordRun};
use crate::models::{new_id, AccessRequest, NotificationPriority, Project, Recipient, RunStatus};
use crate::services::TtlCache;
use crate::Result;

/// Rule name keying the cron_runs bookkeeping row.
pub const RULE_NAME: &str = "auto_approve_access_requests";

/// Review notes written on every auto-approved request.
pub const AUTO_REVIEW_NOTES: &str = "Auto-approved after 24 hours";

/// Reviewer recorded for rule-driven approvals.
pub const AUTO_REVIEWER: &str = "system:auto-approval";

// ============================================================================
// Clock
// ============================================================================

/// Time source for the rule. Injectable so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Tunables for the rule and its scheduler.
#[derive(Debug, Clone)]
pub struct ApprovalSettings {
    /// Seconds between scheduled runs.
    pub interval_secs: u64,
    /// Days until a granted download link expires.
    pub download_expiry_days: i64,
    /// Base URL used for notification links.
    pub public_url: String,
    /// TTL for the project lookup cache.
    pub project_cache_ttl_secs: u64,
}

impl ApprovalSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval_secs: config.approvals.interval_secs,
            download_expiry_days: config.approvals.download_expiry_days,
            public_url: config.server.public_url.clone(),
            project_cache_ttl_secs: config.cache.project_ttl_secs,
        }
    }
}

// ============================================================================
// Run outcome
// ============================================================================

/// Where in the per-request pipeline an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Scan,
    LoadProject,
    Transition,
    NotifyRequester,
    NotifyAdmins,
    ActivityLog,
}

/// One failure inside a run, tagged with the request it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    /// None when the failure happened before any request was in hand
    pub request_number: Option<String>,
    pub stage: RunStage,
    pub message: String,
}

/// Result of a single rule run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Eligible requests returned by the scan
    pub processed: i64,
    pub approved: i64,
    /// Requests no longer pending by the time the update ran
    pub skipped: i64,
    pub errors: Vec<RunError>,
}

enum ProcessResult {
    Approved,
    Skipped,
    Failed,
}

// ============================================================================
// Service
// ============================================================================

/// The auto-approval rule with its project lookup cache.
#[derive(Clone)]
pub struct AutoApprovalService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    db: DbPool,
    clock: Arc<dyn Clock>,
    projects: TtlCache<Project>,
    settings: ApprovalSettings,
}

impl AutoApprovalService {
    pub fn new(db: DbPool, settings: ApprovalSettings) -> Self {
        Self::with_clock(db, settings, Arc::new(SystemClock))
    }

    /// Build the service with an explicit time source.
    pub fn with_clock(db: DbPool, settings: ApprovalSettings, clock: Arc<dyn Clock>) -> Self {
        let projects = TtlCache::new(Duration::from_secs(settings.project_cache_ttl_secs));
        Self {
            inner: Arc::new(ServiceInner {
                db,
                clock,
                projects,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &ApprovalSettings {
        &self.inner.settings
    }

    /// Number of projects currently held by the lookup cache.
    pub fn projects_cached(&self) -> usize {
        self.inner.projects.len()
    }

    /// Drop a project from the lookup cache after it changes.
    pub fn invalidate_project(&self, project_id: &str) {
        self.inner.projects.invalidate(project_id);
    }

    /// Execute one scan over eligible requests.
    ///
    /// A failure of the scan query itself aborts the run with no
    /// partial progress and records an `error` bookkeeping row.
    /// Per-request failures are collected and never stop the scan.
    pub async fn run(&self) -> Result<RunOutcome> {
        let started = self.inner.clock.now();
        info!(rule = RULE_NAME, "Scanning for auto-approvable access requests");

        let eligible = match db::list_eligible_for_auto_approval(&self.inner.db, started).await {
            Ok(requests) => requests,
            Err(e) => {
                error!(rule = RULE_NAME, error = %e, "Eligibility scan failed");
                self.record_failed_run(started, &e.to_string()).await;
                return Err(e);
            }
        };

        let mut outcome = RunOutcome {
            status: RunStatus::Success,
            processed: eligible.len() as i64,
            approved: 0,
            skipped: 0,
            errors: Vec::new(),
        };

        for request in &eligible {
            match self
                .process_request(request, started, &mut outcome.errors)
                .await
            {
                ProcessResult::Approved => outcome.approved += 1,
                ProcessResult::Skipped => outcome.skipped += 1,
                ProcessResult::Failed => {}
            }
        }

        if !outcome.errors.is_empty() {
            outcome.status = RunStatus::PartialSuccess;
        }

        if let Err(e) = self.record_run(started, &outcome).await {
            warn!(rule = RULE_NAME, error = %e, "Failed to record run bookkeeping");
        }

        info!(
            rule = RULE_NAME,
            processed = outcome.processed,
            approved = outcome.approved,
            skipped = outcome.skipped,
            errors = outcome.errors.len(),
            "Auto-approval run finished"
        );

        Ok(outcome)
    }

    /// Approve one eligible request. Each request is its own unit of
    /// work; a failure leaves it pending for the next run.
    async fn process_request(
        &self,
        request: &AccessRequest,
        now: DateTime<Utc>,
        errors: &mut Vec<RunError>,
    ) -> ProcessResult {
        let project = match self.load_project(&request.project_id).await {
            Ok(project) => project,
            Err(e) => {
                warn!(
                    request = %request.request_number,
                    project_id = %request.project_id,
                    error = %e,
                    "Project lookup failed, request stays pending"
                );
                errors.push(RunError {
                    request_number: Some(request.request_number.clone()),
                    stage: RunStage::LoadProject,
                    message: e.to_string(),
                });
                return ProcessResult::Failed;
            }
        };

        let fields = ApproveRequest {
            reviewed_by: AUTO_REVIEWER.to_string(),
            review_notes: Some(AUTO_REVIEW_NOTES.to_string()),
            repo_url: project.repo_url.clone(),
            download_url: project.download_url.clone(),
            download_expires_at: Some(
                now + chrono::Duration::days(self.inner.settings.download_expiry_days),
            ),
            approved_at: now,
        };

        match db::approve_request_if_pending(&self.inner.db, &request.id, &fields).await {
            Ok(true) => {}
            Ok(false) => {
                // Reviewed by someone else between the scan and this update
                debug!(request = %request.request_number, "No longer pending, skipping");
                return ProcessResult::Skipped;
            }
            Err(e) => {
                warn!(request = %request.request_number, error = %e, "Transition failed");
                errors.push(RunError {
                    request_number: Some(request.request_number.clone()),
                    stage: RunStage::Transition,
                    message: e.to_string(),
                });
                return ProcessResult::Failed;
            }
        }

        info!(
            request = %request.request_number,
            user_id = %request.user_id,
            project = %project.slug,
            "Access request auto-approved"
        );

        self.notify_and_log(request, &project, errors).await;
        ProcessResult::Approved
    }

    /// Project lookup through the TTL cache.
    async fn load_project(&self, project_id: &str) -> Result<Project> {
        if let Some(project) = self.inner.projects.get(project_id) {
            return Ok(project);
        }
        let project = db::get_project(&self.inner.db, project_id).await?;
        self.inner.projects.insert(project_id, project.clone());
        Ok(project)
    }

    /// Best-effort side effects for one approval. Failures are
    /// collected; the committed transition stands regardless.
    async fn notify_and_log(
        &self,
        request: &AccessRequest,
        project: &Project,
        errors: &mut Vec<RunError>,
    ) {
        let link = format!(
            "{}/requests/{}",
            self.inner.settings.public_url.trim_end_matches('/'),
            request.id
        );

        let user_notification = CreateNotification {
            id: new_id(),
            recipient: Recipient::User(request.user_id.clone()),
            title: format!("Access request {} approved", request.request_number),
            message: format!(
                "Your access request for {} has been approved. The download link is valid for {} days.",
                project.name, self.inner.settings.download_expiry_days
            ),
            link: Some(link.clone()),
            priority: NotificationPriority::Normal,
        };
        if let Err(e) = db::create_notification(&self.inner.db, user_notification).await {
            warn!(request = %request.request_number, error = %e, "Requester notification failed");
            errors.push(RunError {
                request_number: Some(request.request_number.clone()),
                stage: RunStage::NotifyRequester,
                message: e.to_string(),
            });
        }

        let admin_notification = CreateNotification {
            id: new_id(),
            recipient: Recipient::Admins,
            title: format!("Auto-approved: {}", request.request_number),
            message: format!(
                "Access request {} for {} was auto-approved for user {}.",
                request.request_number, project.name, request.user_id
            ),
            link: Some(link),
            priority: NotificationPriority::Low,
        };
        if let Err(e) = db::create_notification(&self.inner.db, admin_notification).await {
            warn!(request = %request.request_number, error = %e, "Admin notification failed");
            errors.push(RunError {
                request_number: Some(request.request_number.clone()),
                stage: RunStage::NotifyAdmins,
                message: e.to_string(),
            });
        }

        let metadata = serde_json::json!({
            "request_number": request.request_number,
            "user_id": request.user_id,
        });
        let activity = CreateActivity {
            id: new_id(),
            event_type: "access_request.auto_approved".to_string(),
            actor: AUTO_REVIEWER.to_string(),
            project_id: Some(request.project_id.clone()),
            subject_id: Some(request.id.clone()),
            message: format!("Access request {} was auto-approved", request.request_number),
            metadata: Some(metadata.to_string()),
        };
        if let Err(e) = db::append_activity(&self.inner.db, activity).await {
            warn!(request = %request.request_number, error = %e, "Activity append failed");
            errors.push(RunError {
                request_number: Some(request.request_number.clone()),
                stage: RunStage::ActivityLog,
                message: e.to_string(),
            });
        }
    }

    async fn record_run(&self, started: DateTime<Utc>, outcome: &RunOutcome) -> Result<()> {
        let last_error = if outcome.errors.is_empty() {
            None
        } else {
            serde_json::to_string(&outcome.errors).ok()
        };

        db::record_run(
            &self.inner.db,
            RecordRun {
                name: RULE_NAME.to_string(),
                last_run_at: started,
                next_run_at: Some(started + self.next_run_offset()),
                status: outcome.status,
                processed: outcome.processed,
                last_error,
            },
        )
        .await?;
        Ok(())
    }

    /// Best-effort bookkeeping when the scan itself fails.
    async fn record_failed_run(&self, started: DateTime<Utc>, message: &str) {
        let errors = vec![RunError {
            request_number: None,
            stage: RunStage::Scan,
            message: message.to_string(),
        }];

        let result = db::record_run(
            &self.inner.db,
            RecordRun {
                name: RULE_NAME.to_string(),
                last_run_at: started,
                next_run_at: Some(started + self.next_run_offset()),
                status: RunStatus::Error,
                processed: 0,
                last_error: serde_json::to_string(&errors).ok(),
            },
        )
        .await;

        if let Err(e) = result {
            warn!(rule = RULE_NAME, error = %e, "Failed to record failed run");
        }
    }

    fn next_run_offset(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inner.settings.interval_secs as i64)
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Background scheduler triggering the rule on a fixed interval.
#[derive(Clone)]
pub struct ApprovalScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    service: AutoApprovalService,
    running: RwLock<bool>,
    scheduler_id: String,
}

impl ApprovalScheduler {
    pub fn new(service: AutoApprovalService) -> Self {
        let scheduler_id = format!("approvals-{}", nanoid::nanoid!(8));
        Self {
            inner: Arc::new(SchedulerInner {
                service,
                running: RwLock::new(false),
                scheduler_id,
            }),
        }
    }

    /// Start the scheduling loop.
    /// Returns a handle that can be used to stop it.
    pub async fn start(&self) -> ApprovalSchedulerHandle {
        *self.inner.running.write().await = true;

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            scheduler.run_loop().await;
        });

        info!(
            scheduler_id = %self.inner.scheduler_id,
            interval_secs = self.inner.service.settings().interval_secs,
            "Approval scheduler started"
        );

        ApprovalSchedulerHandle {
            scheduler: self.clone(),
            _handle: handle,
        }
    }

    async fn run_loop(&self) {
        let interval = self.inner.service.settings().interval_secs.max(1);

        loop {
            if !*self.inner.running.read().await {
                info!(scheduler_id = %self.inner.scheduler_id, "Approval scheduler stopping");
                break;
            }

            if let Err(e) = self.inner.service.run().await {
                error!(scheduler_id = %self.inner.scheduler_id, error = %e, "Scheduled run failed");
            }

            sleep(Duration::from_secs(interval)).await;
        }
    }

    /// Stop the scheduler.
    pub async fn stop(&self) {
        *self.inner.running.write().await = false;
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> ApprovalSchedulerStatus {
        ApprovalSchedulerStatus {
            running: *self.inner.running.read().await,
            scheduler_id: self.inner.scheduler_id.clone(),
        }
    }
}

/// Handle for the running scheduler.
pub struct ApprovalSchedulerHandle {
    scheduler: ApprovalScheduler,
    _handle: tokio::task::JoinHandle<()>,
}

impl ApprovalSchedulerHandle {
    /// Stop the scheduler.
    pub async fn stop(self) {
        self.scheduler.stop().await;
    }
}

/// Scheduler status.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalSchedulerStatus {
    pub running: bool,
    pub scheduler_id: String,
}
