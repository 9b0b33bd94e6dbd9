use actix_web::{get, post, web, HttpResponse, Responder};
use application::chat::{
    dtos::SendMessageRequest, get_thread::GetThreadUseCase,
    list_conversations::ListConversationsUseCase, send_message::SendMessageUseCase,
    unread_count::UnreadCountUseCase,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::extractors::AuthUser;
use crate::handlers::error_handler::HttpAppError;
use crate::websocket::connection::WsPresenceRegistry;
use crate::websocket::handler::notify_new_message;

#[post("")]
pub async fn send_message(
    db: web::Data<DatabaseConnection>,
    registry: web::Data<WsPresenceRegistry>,
    auth: AuthUser,
    body: web::Json<SendMessageRequest>,
) -> Result<impl Responder, HttpAppError> {
    let message = SendMessageUseCase::execute(db.get_ref(), auth.user_id, body.into_inner()).await?;
    // Same live-delivery step as the realtime path: an online receiver
    // sees the message without polling.
    notify_new_message(registry.get_ref(), &message).await;
    Ok(HttpResponse::Created().json(message))
}

#[get("")]
pub async fn list_conversations(
    db: web::Data<DatabaseConnection>,
    auth: AuthUser,
) -> Result<impl Responder, HttpAppError> {
    let conversations = ListConversationsUseCase::execute(db.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

#[get("/unread/count")]
pub async fn unread_count(
    db: web::Data<DatabaseConnection>,
    auth: AuthUser,
) -> Result<impl Responder, HttpAppError> {
    let response = UnreadCountUseCase::execute(db.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(serde::Deserialize)]
pub struct ThreadQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// Registered after /unread/count so the literal path wins.
#[get("/{user_id}")]
pub async fn get_thread(
    db: web::Data<DatabaseConnection>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<ThreadQuery>,
) -> Result<impl Responder, HttpAppError> {
    let other_user_id = path.into_inner();
    let thread = GetThreadUseCase::execute(
        db.get_ref(),
        auth.user_id,
        other_user_id,
        query.page,
        query.limit,
    )
    .await?;
    Ok(HttpResponse::Ok().json(thread))
}
