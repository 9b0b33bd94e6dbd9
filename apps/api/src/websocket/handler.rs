use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_ws::{Message, Session};
use application::auth::{decode_token, subject_id};
use application::chat::dtos::{PopulatedMessageDto, SendMessageRequest};
use application::chat::send_message::SendMessageUseCase;
use futures::StreamExt;
use reel_core::entities::users;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;
use uuid::Uuid;

use super::connection::{PresenceRegistry, PresenceSlot, WsPresenceRegistry};
use super::messages::{ClientMessage, PresenceStatus, ServerMessage};
use crate::config::Config;

/// Serialize a ServerMessage and send it as a JSON text frame.
/// Fire-and-forget: a failed send is logged, never propagated.
async fn send_msg(session: &mut Session, msg: &ServerMessage) {
    match serde_json::to_string(msg) {
        Ok(text) => {
            if let Err(e) = session.text(text).await {
                tracing::debug!("Failed to send message to session: {}", e);
            }
        }
        Err(e) => tracing::error!("Failed to serialize outbound message: {}", e),
    }
}

/// Deliver a presence/status event to every live connection.
async fn broadcast(registry: &WsPresenceRegistry, msg: &ServerMessage) {
    for mut slot in registry.snapshot().await {
        send_msg(&mut slot.session, msg).await;
    }
}

fn parse_client_message(data: &[u8]) -> Result<ClientMessage, String> {
    serde_json::from_slice(data).map_err(|e| format!("Malformed event: {}", e))
}

/// An outbound event addressed to one live session.
pub struct Delivery<S> {
    pub session: S,
    pub message: ServerMessage,
}

/// The receiver's copy of a persisted message, if the receiver currently
/// holds a presence slot.
async fn receiver_delivery<S: Clone>(
    registry: &PresenceRegistry<S>,
    message: &PopulatedMessageDto,
) -> Option<Delivery<S>> {
    let slot = registry.lookup(message.receiver.id).await?;
    Some(Delivery {
        session: slot.session,
        message: ServerMessage::NewMessage {
            message_id: message.id,
            sender_id: message.sender.id,
            receiver_id: message.receiver.id,
            content: message.content.clone(),
            created_at: message.created_at,
            is_sent: None,
            is_received: Some(true),
        },
    })
}

/// Push a freshly persisted message to the receiver's live connection, if
/// any. Shared by the realtime router and the REST send endpoint so both
/// paths notify the same way.
pub async fn notify_new_message(registry: &WsPresenceRegistry, message: &PopulatedMessageDto) {
    if let Some(mut delivery) = receiver_delivery(registry, message).await {
        send_msg(&mut delivery.session, &delivery.message).await;
    }
}

/// Resolve one inbound client event into the outbound deliveries it
/// produces. Owns every routing decision (persistence, self-notification
/// suppression, offline drops); callers only perform the sends, so the
/// decisions are testable without a live socket.
pub async fn route_event<S: Clone>(
    db: &DatabaseConnection,
    registry: &PresenceRegistry<S>,
    sender_id: Uuid,
    own_session: &S,
    event: ClientMessage,
) -> Vec<Delivery<S>> {
    match event {
        ClientMessage::SendMessage {
            receiver_id,
            content,
        } => {
            // Durable-first: persist through the same use case as the
            // REST endpoint, then notify live connections.
            let request = SendMessageRequest {
                receiver_id,
                content,
            };
            match SendMessageUseCase::execute(db, sender_id, request).await {
                Ok(message) => {
                    let mut deliveries = vec![Delivery {
                        session: own_session.clone(),
                        message: ServerMessage::NewMessage {
                            message_id: message.id,
                            sender_id,
                            receiver_id,
                            content: message.content.clone(),
                            created_at: message.created_at,
                            is_sent: Some(true),
                            is_received: None,
                        },
                    }];
                    if let Some(delivery) = receiver_delivery(registry, &message).await {
                        deliveries.push(delivery);
                    }
                    deliveries
                }
                Err(e) => {
                    tracing::warn!("sendMessage from {} failed: {}", sender_id, e);
                    vec![Delivery {
                        session: own_session.clone(),
                        message: ServerMessage::Error {
                            message: e.to_string(),
                        },
                    }]
                }
            }
        }
        ClientMessage::CommentVideo {
            video_owner_id,
            video_id,
            comment_id,
        } => {
            // Self-notifications are suppressed
            if video_owner_id == sender_id {
                return Vec::new();
            }
            match registry.lookup(video_owner_id).await {
                Some(slot) => vec![Delivery {
                    session: slot.session,
                    message: ServerMessage::NewComment {
                        video_id,
                        comment_id,
                        commenter_id: sender_id,
                    },
                }],
                None => Vec::new(),
            }
        }
        ClientMessage::LikeVideo {
            video_owner_id,
            video_id,
        } => {
            if video_owner_id == sender_id {
                return Vec::new();
            }
            match registry.lookup(video_owner_id).await {
                Some(slot) => vec![Delivery {
                    session: slot.session,
                    message: ServerMessage::NewLike {
                        video_id,
                        liker_id: sender_id,
                    },
                }],
                None => Vec::new(),
            }
        }
        ClientMessage::Typing {
            receiver_id,
            is_typing,
        } => {
            // No buffering: dropped silently if the receiver is offline
            match registry.lookup(receiver_id).await {
                Some(slot) => vec![Delivery {
                    session: slot.session,
                    message: ServerMessage::UserTyping {
                        user_id: sender_id,
                        is_typing,
                    },
                }],
                None => Vec::new(),
            }
        }
    }
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: String,
}

#[get("/ws")]
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<WsPresenceRegistry>,
    config: web::Data<Config>,
    db: web::Data<DatabaseConnection>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, Error> {
    // Handshake: verify the token and resolve it to a known identity.
    // Fails closed; the connection never reaches the connected state.
    let user_id = match decode_token(&query.token, &config.jwt_secret)
        .and_then(|claims| subject_id(&claims))
    {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!("Rejected WebSocket handshake: {}", e);
            return Ok(HttpResponse::Unauthorized().finish());
        }
    };

    let identity = match users::Entity::find_by_id(user_id).one(db.get_ref()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Rejected WebSocket handshake: unknown user {}", user_id);
            return Ok(HttpResponse::Unauthorized().finish());
        }
        Err(e) => {
            tracing::error!("Identity lookup failed during handshake: {}", e);
            return Ok(HttpResponse::InternalServerError().finish());
        }
    };

    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let conn_id = Uuid::new_v4();
    registry
        .upsert(PresenceSlot {
            user_id,
            username: identity.username.clone(),
            conn_id,
            session: session.clone(),
        })
        .await;
    tracing::info!(
        "User {} ({}) connected (Conn ID: {})",
        identity.username,
        user_id,
        conn_id
    );
    broadcast(
        &registry,
        &ServerMessage::UserStatus {
            user_id,
            status: PresenceStatus::Online,
        },
    )
    .await;

    let db = db.clone();
    let registry = registry.clone();

    actix_web::rt::spawn(async move {
        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                msg @ (Message::Text(_) | Message::Binary(_)) => {
                    let data: &[u8] = match &msg {
                        Message::Text(text) => text.as_bytes(),
                        Message::Binary(bin) => bin.as_ref(),
                        _ => unreachable!(),
                    };
                    let event = match parse_client_message(data) {
                        Ok(event) => event,
                        Err(message) => {
                            // A bad frame never terminates the connection
                            send_msg(&mut session, &ServerMessage::Error { message }).await;
                            continue;
                        }
                    };
                    let deliveries =
                        route_event(&db, registry.get_ref(), user_id, &session, event).await;
                    for mut delivery in deliveries {
                        send_msg(&mut delivery.session, &delivery.message).await;
                    }
                }
                Message::Ping(bytes) => {
                    let _ = session.pong(&bytes).await;
                }
                Message::Close(reason) => {
                    tracing::info!("WebSocket closed: {:?}", reason);
                    break;
                }
                _ => {}
            }
        }

        // Only the connection that still owns the slot marks the user
        // offline; a stale disconnect after a reconnect is a no-op.
        if registry.remove(user_id, conn_id).await {
            broadcast(
                &registry,
                &ServerMessage::UserStatus {
                    user_id,
                    status: PresenceStatus::Offline,
                },
            )
            .await;
        }
        tracing::info!("Connection {} closed", conn_id);
    });

    Ok(response)
}
