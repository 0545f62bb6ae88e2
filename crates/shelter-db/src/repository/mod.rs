//! SurrealDB repository implementations.

mod activity;
mod animal;
mod announcement;
mod comment;
mod group;
mod maintenance;
mod report;
mod skill_tag;
mod user;

pub use activity::SurrealActivityRepository;
pub use animal::SurrealAnimalRepository;
pub use announcement::SurrealAnnouncementRepository;
pub use comment::SurrealCommentRepository;
pub use group::SurrealGroupRepository;
pub use maintenance::SurrealMaintenanceRepository;
pub use report::SurrealReportRepository;
pub use skill_tag::SurrealSkillTagRepository;
pub use user::SurrealUserRepository;
