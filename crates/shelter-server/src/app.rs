//! Service graph assembly.

use shelter_auth::{AccessEvaluator, Principal, TokenKeys};
use shelter_core::error::ShelterResult;
use shelter_db::repository::{
    SurrealActivityRepository, SurrealAnimalRepository, SurrealAnnouncementRepository,
    SurrealCommentRepository, SurrealGroupRepository, SurrealMaintenanceRepository,
    SurrealReportRepository, SurrealSkillTagRepository, SurrealUserRepository,
};
use shelter_service::{
    ActivityFeed, AnnouncementService, CommentService, DispatcherWorker, EmailDispatcher,
    EmailSender, MaintenanceService, ReportingService, ServiceConfig, SkillTagService,
};
use surrealdb::{Connection, Surreal};
use tracing::info;

pub type Feed<C> = ActivityFeed<SurrealGroupRepository<C>, SurrealActivityRepository<C>>;
pub type Comments<C> =
    CommentService<SurrealGroupRepository<C>, SurrealAnimalRepository<C>, SurrealCommentRepository<C>>;
pub type Announcements<C> = AnnouncementService<
    SurrealGroupRepository<C>,
    SurrealAnnouncementRepository<C>,
    SurrealUserRepository<C>,
>;
pub type SkillTags<C> = SkillTagService<SurrealGroupRepository<C>, SurrealSkillTagRepository<C>>;

/// Every service, wired to one SurrealDB handle.
pub struct App<C: Connection> {
    pub feed: Feed<C>,
    pub comments: Comments<C>,
    pub announcements: Announcements<C>,
    pub skill_tags: SkillTags<C>,
    pub reporting: ReportingService<SurrealReportRepository<C>>,
    pub maintenance: MaintenanceService<SurrealMaintenanceRepository<C>>,
    tokens: TokenKeys,
}

impl<C: Connection> App<C> {
    /// Build the services and start the email dispatcher. The returned
    /// worker must be shut down to flush queued announcement emails.
    /// Must be called inside a Tokio runtime.
    pub fn build<E: EmailSender>(
        db: Surreal<C>,
        tokens: TokenKeys,
        config: ServiceConfig,
        sender: E,
    ) -> (Self, DispatcherWorker) {
        let access = AccessEvaluator::new(SurrealGroupRepository::new(db.clone()));
        let (dispatcher, worker) = EmailDispatcher::start(
            sender,
            config.email_workers,
            config.email_queue_capacity,
        );
        info!(
            email_enabled = dispatcher.is_enabled(),
            email_workers = config.email_workers,
            "Services ready"
        );

        let app = Self {
            feed: ActivityFeed::new(
                access.clone(),
                SurrealActivityRepository::new(db.clone()),
                config.clone(),
            ),
            comments: CommentService::new(
                access.clone(),
                SurrealAnimalRepository::new(db.clone()),
                SurrealCommentRepository::new(db.clone()),
            ),
            announcements: AnnouncementService::new(
                access.clone(),
                SurrealAnnouncementRepository::new(db.clone()),
                SurrealUserRepository::new(db.clone()),
                dispatcher,
            ),
            skill_tags: SkillTagService::new(access, SurrealSkillTagRepository::new(db.clone())),
            reporting: ReportingService::new(SurrealReportRepository::new(db.clone())),
            maintenance: MaintenanceService::new(SurrealMaintenanceRepository::new(db), config),
            tokens,
        };
        (app, worker)
    }

    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    /// Resolve a bearer token into the caller's identity.
    pub fn authenticate(&self, token: &str) -> ShelterResult<Principal> {
        let claims = self.tokens.validate(token)?;
        Ok(Principal::from(claims))
    }
}
