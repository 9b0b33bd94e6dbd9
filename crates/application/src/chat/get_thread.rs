use super::dtos::ThreadResponse;
use super::{thread_filter, DEFAULT_THREAD_LIMIT};
use crate::AppError;
use chrono::Utc;
use reel_core::entities::{messages, users};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

pub struct GetThreadUseCase;

impl GetThreadUseCase {
    /// Fetch one page of the thread between the requester and another user,
    /// newest-first at the storage layer then reversed to chronological
    /// order for the client.
    ///
    /// Side effect on every call, regardless of the requested page: all
    /// unread messages from the other user to the requester are marked read.
    /// Paging backward through history therefore also clears unread state
    /// for messages outside the fetched page.
    pub async fn execute(
        db: &DatabaseConnection,
        user_id: Uuid,
        other_user_id: Uuid,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<ThreadResponse, AppError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_THREAD_LIMIT).max(1);

        let other = users::Entity::find_by_id(other_user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let total = messages::Entity::find()
            .filter(thread_filter(user_id, other_user_id))
            .count(db)
            .await?;

        let mut page_messages = messages::Entity::find()
            .filter(thread_filter(user_id, other_user_id))
            .order_by_desc(messages::Column::CreatedAt)
            // page is client-supplied and unbounded; saturate instead of
            // overflowing on absurd values
            .offset((page - 1).saturating_mul(limit))
            .limit(limit)
            .all(db)
            .await?;
        page_messages.reverse();

        let marked = messages::Entity::update_many()
            .col_expr(messages::Column::IsRead, Expr::value(true))
            .col_expr(messages::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(messages::Column::SenderId.eq(other_user_id))
            .filter(messages::Column::ReceiverId.eq(user_id))
            .filter(messages::Column::IsRead.eq(false))
            .exec(db)
            .await?;
        if marked.rows_affected > 0 {
            tracing::debug!(
                "Marked {} messages from {} to {} as read",
                marked.rows_affected,
                other_user_id,
                user_id
            );
        }

        let total_pages = total.div_ceil(limit);

        Ok(ThreadResponse {
            messages: page_messages.into_iter().map(Into::into).collect(),
            user: other.into(),
            page,
            limit,
            total,
            total_pages,
        })
    }
}
