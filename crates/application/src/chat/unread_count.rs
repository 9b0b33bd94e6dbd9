use super::dtos::UnreadCountResponse;
use crate::AppError;
use reel_core::entities::messages;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

pub struct UnreadCountUseCase;

impl UnreadCountUseCase {
    /// Total unread messages addressed to the user, summed across all
    /// counterparts.
    pub async fn execute(
        db: &DatabaseConnection,
        user_id: Uuid,
    ) -> Result<UnreadCountResponse, AppError> {
        let unread_count = messages::Entity::find()
            .filter(messages::Column::ReceiverId.eq(user_id))
            .filter(messages::Column::IsRead.eq(false))
            .count(db)
            .await?;

        Ok(UnreadCountResponse { unread_count })
    }
}
