use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events a connected client may send. Video and comment ids are opaque
/// strings owned by the wider application; only user ids resolve here.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Send a direct message (persisted, then delivered live)
    SendMessage { receiver_id: Uuid, content: String },
    /// Notify a video owner about a new comment
    CommentVideo {
        video_owner_id: Uuid,
        video_id: String,
        comment_id: String,
    },
    /// Notify a video owner about a new like
    LikeVideo {
        video_owner_id: Uuid,
        video_id: String,
    },
    /// Typing indicator, forwarded only while the receiver is online
    Typing { receiver_id: Uuid, is_typing: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Events the server emits to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    NewMessage {
        message_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: String,
        created_at: DateTime<FixedOffset>,
        /// Optimistic confirmation on the sender's own connection
        #[serde(skip_serializing_if = "Option::is_none")]
        is_sent: Option<bool>,
        /// Set on the copy delivered to the receiver
        #[serde(skip_serializing_if = "Option::is_none")]
        is_received: Option<bool>,
    },
    NewComment {
        video_id: String,
        comment_id: String,
        commenter_id: Uuid,
    },
    NewLike {
        video_id: String,
        liker_id: Uuid,
    },
    UserTyping {
        user_id: Uuid,
        is_typing: bool,
    },
    /// Broadcast to every live connection on presence changes
    UserStatus {
        user_id: Uuid,
        status: PresenceStatus,
    },
    /// Per-event failure, delivered to the originating connection only
    Error { message: String },
}
