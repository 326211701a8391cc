//! Service layer for OpsDesk.
//!
//! Contains the business logic behind the API:
//! - Estimator (project pricing and timeline estimates)
//! - Seo (content metadata extraction)
//! - AutoApproval (scheduled approval of overdue access requests)
//! - TtlCache (small in-memory cache used by the approval scan)

pub mod auto_approval;
pub mod cache;
pub mod estimator;
pub mod seo;

pub use auto_approval::{
    ApprovalScheduler, ApprovalSettings, AutoApprovalService, Clock, SystemClock,
};
pub use cache::TtlCache;
