//! Shelter Service: the request-facing operations, generic over the
//! `shelter-core` repository traits.
//!
//! Every operation takes the calling [`Principal`](shelter_auth::Principal)
//! and performs its own access check before touching data.

pub mod announcements;
pub mod comments;
pub mod config;
pub mod feed;
pub mod maintenance;
pub mod notify;
pub mod reporting;
pub mod skill_tags;

pub use announcements::{AnnouncementService, NewAnnouncement, PostedAnnouncement};
pub use comments::{CommentService, NewComment};
pub use config::ServiceConfig;
pub use feed::ActivityFeed;
pub use maintenance::MaintenanceService;
pub use notify::{
    DeliveryFailure, DeliveryReceipt, DeliveryReport, DispatcherWorker, EmailDispatcher,
    EmailJob, EmailSender, NotifyError,
};
pub use reporting::ReportingService;
pub use skill_tags::SkillTagService;
