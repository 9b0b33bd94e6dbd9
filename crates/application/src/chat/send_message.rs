use super::dtos::{PopulatedMessageDto, SendMessageRequest};
use crate::AppError;
use chrono::Utc;
use reel_core::entities::{messages, users};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;
use validator::Validate;

pub struct SendMessageUseCase;

impl SendMessageUseCase {
    /// Persist a direct message and return it populated with sender and
    /// receiver display fields. The only durable write path for messages;
    /// both the REST endpoint and the realtime router go through here.
    pub async fn execute(
        db: &DatabaseConnection,
        sender_id: Uuid,
        req: SendMessageRequest,
    ) -> Result<PopulatedMessageDto, AppError> {
        req.validate()?;

        if req.receiver_id == sender_id {
            return Err(AppError::Validation(
                "You cannot send a message to yourself".to_string(),
            ));
        }

        let content = req.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Message content must not be empty".to_string(),
            ));
        }

        let receiver = users::Entity::find_by_id(req.receiver_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let sender = users::Entity::find_by_id(sender_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = Utc::now();
        let message = messages::ActiveModel {
            message_id: Set(Uuid::new_v4()),
            sender_id: Set(sender_id),
            receiver_id: Set(req.receiver_id),
            content: Set(content),
            is_read: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let inserted = message.insert(db).await?;

        Ok(PopulatedMessageDto {
            id: inserted.message_id,
            sender: sender.into(),
            receiver: receiver.into(),
            content: inserted.content,
            is_read: inserted.is_read,
            created_at: inserted.created_at,
        })
    }
}
