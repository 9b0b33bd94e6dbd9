use super::dtos::ConversationSummaryDto;
use super::thread_filter;
use crate::AppError;
use reel_core::entities::{messages, users};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

pub struct ListConversationsUseCase;

impl ListConversationsUseCase {
    /// Build the conversation list: one entry per counterpart with the
    /// latest message between the pair and the requester's unread count.
    ///
    /// Deliberately a per-counterpart fan-out (latest + count + user lookup
    /// each). Fine for a single instance; batching would be the first thing
    /// to revisit under load, as long as the per-conversation semantics stay
    /// intact.
    pub async fn execute(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummaryDto>, AppError> {
        let involving = messages::Entity::find()
            .filter(
                Condition::any()
                    .add(messages::Column::SenderId.eq(user_id))
                    .add(messages::Column::ReceiverId.eq(user_id)),
            )
            .all(db)
            .await?;

        // Distinct counterparts in encounter order
        let mut counterparts: Vec<Uuid> = Vec::new();
        for msg in &involving {
            let other = if msg.sender_id == user_id {
                msg.receiver_id
            } else {
                msg.sender_id
            };
            if !counterparts.contains(&other) {
                counterparts.push(other);
            }
        }

        let mut summaries = Vec::new();
        for other_id in counterparts {
            let latest = messages::Entity::find()
                .filter(thread_filter(user_id, other_id))
                .order_by_desc(messages::Column::CreatedAt)
                .one(db)
                .await?;

            // Unreachable given how the counterpart set was derived
            let Some(latest) = latest else { continue };

            let unread_count = messages::Entity::find()
                .filter(messages::Column::SenderId.eq(other_id))
                .filter(messages::Column::ReceiverId.eq(user_id))
                .filter(messages::Column::IsRead.eq(false))
                .count(db)
                .await?;

            let Some(user) = users::Entity::find_by_id(other_id).one(db).await? else {
                tracing::warn!("Skipping conversation with missing user {}", other_id);
                continue;
            };

            summaries.push(ConversationSummaryDto {
                user: user.into(),
                latest_message: latest.into(),
                unread_count,
            });
        }

        summaries.sort_by(|a, b| b.latest_message.created_at.cmp(&a.latest_message.created_at));

        Ok(summaries)
    }
}
