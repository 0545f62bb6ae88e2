//! Group and site-wide announcements.

use shelter_auth::{AccessEvaluator, AccessLevel, Principal};
use shelter_core::error::{ShelterError, ShelterResult};
use shelter_core::models::announcement::{Announcement, CreateAnnouncement};
use shelter_core::repository::{AnnouncementRepository, GroupRepository, UserRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::notify::{DeliveryReceipt, EmailDispatcher, EmailJob};

/// An announcement as submitted by a caller. `group_id: None` posts a
/// site-wide announcement.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub group_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub send_email: bool,
}

#[derive(Debug)]
pub struct PostedAnnouncement {
    pub announcement: Announcement,
    /// Present when emails were queued.
    pub delivery: Option<DeliveryReceipt>,
}

pub struct AnnouncementService<G, N, U>
where
    G: GroupRepository,
    N: AnnouncementRepository,
    U: UserRepository,
{
    access: AccessEvaluator<G>,
    announcements: N,
    users: U,
    dispatcher: EmailDispatcher,
}

impl<G, N, U> AnnouncementService<G, N, U>
where
    G: GroupRepository,
    N: AnnouncementRepository,
    U: UserRepository,
{
    pub fn new(
        access: AccessEvaluator<G>,
        announcements: N,
        users: U,
        dispatcher: EmailDispatcher,
    ) -> Self {
        Self {
            access,
            announcements,
            users,
            dispatcher,
        }
    }

    /// Post an announcement. Group announcements need membership,
    /// site-wide ones need a site admin.
    ///
    /// Email delivery happens after the announcement is stored and
    /// cannot undo it. Problems reaching the queue are logged and leave
    /// `delivery` empty.
    pub async fn post_announcement(
        &self,
        principal: &Principal,
        input: NewAnnouncement,
    ) -> ShelterResult<PostedAnnouncement> {
        match input.group_id {
            Some(group_id) => {
                self.access
                    .require(principal, group_id, AccessLevel::Member)
                    .await?
            }
            None if principal.is_site_admin => {}
            None => return Err(ShelterError::AccessDenied),
        }

        let title = input.title.trim().to_string();
        let content = input.content.trim().to_string();
        if title.is_empty() {
            return Err(ShelterError::validation("title must not be empty"));
        }
        if content.is_empty() {
            return Err(ShelterError::validation("content must not be empty"));
        }

        let announcement = self
            .announcements
            .create(CreateAnnouncement {
                group_id: input.group_id,
                author_id: principal.user_id,
                title,
                content,
                send_email: input.send_email,
            })
            .await?;
        info!(
            announcement_id = %announcement.id,
            group_id = ?announcement.group_id,
            "Announcement posted"
        );

        let delivery = if input.send_email {
            self.queue_emails(&announcement).await
        } else {
            None
        };

        Ok(PostedAnnouncement {
            announcement,
            delivery,
        })
    }

    async fn queue_emails(&self, announcement: &Announcement) -> Option<DeliveryReceipt> {
        if !self.dispatcher.is_enabled() {
            warn!(announcement_id = %announcement.id, "Email is not configured, skipping delivery");
            return None;
        }

        let recipients = match announcement.group_id {
            Some(group_id) => self.access.groups().member_emails(group_id).await,
            None => self.users.active_emails().await,
        };
        let mut recipients = match recipients {
            Ok(r) => r,
            Err(e) => {
                warn!(announcement_id = %announcement.id, error = ?e, "Could not load recipients");
                return None;
            }
        };
        recipients.retain(|r| !r.is_empty());
        recipients.sort();
        recipients.dedup();
        if recipients.is_empty() {
            return None;
        }

        let job = EmailJob {
            announcement_id: announcement.id,
            title: announcement.title.clone(),
            body: announcement.content.clone(),
            recipients,
        };
        match self.dispatcher.enqueue(job) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                warn!(announcement_id = %announcement.id, error = %e, "Announcement emails not queued");
                None
            }
        }
    }

    /// Soft-delete an announcement. Allowed for its author, for admins
    /// of its group and for site admins.
    pub async fn delete_announcement(
        &self,
        principal: &Principal,
        announcement_id: Uuid,
    ) -> ShelterResult<()> {
        let announcement = self
            .access
            .require_for_announcement(
                &self.announcements,
                principal,
                announcement_id,
                AccessLevel::Member,
            )
            .await?;

        let allowed = announcement.author_id == principal.user_id
            || principal.is_site_admin
            || match announcement.group_id {
                Some(group_id) => {
                    self.access
                        .authorize(principal, group_id, AccessLevel::GroupAdmin)
                        .await
                }
                None => false,
            };
        if !allowed {
            return Err(ShelterError::AccessDenied);
        }

        self.announcements.delete(announcement.id).await?;
        info!(%announcement_id, user_id = %principal.user_id, "Announcement deleted");
        Ok(())
    }
}
