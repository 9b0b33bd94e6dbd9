pub mod dtos;
pub mod get_thread;
pub mod list_conversations;
pub mod send_message;
pub mod unread_count;

#[cfg(test)]
mod use_cases_test;

use reel_core::entities::messages;
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

/// Default page size for a chat thread
pub const DEFAULT_THREAD_LIMIT: u64 = 30;

/// Filter matching every message exchanged between exactly two users,
/// in either direction.
pub(crate) fn thread_filter(a: Uuid, b: Uuid) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(a))
                .add(messages::Column::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(messages::Column::SenderId.eq(b))
                .add(messages::Column::ReceiverId.eq(a)),
        )
}
