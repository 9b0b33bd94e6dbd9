use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::config::Config;
use api::handlers::{chats, health};
use api::middleware::auth::AuthMiddleware;
use api::middleware::rate_limit::PerIpRateLimitMiddleware;
use api::websocket::connection::WsPresenceRegistry;
use api::websocket::handler::websocket_handler;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,api=debug,actix_web=info".into());

    let is_json = std::env::var("LOG_FORMAT").unwrap_or_default() == "json";

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }

    let config = Config::from_env()?;
    let config_data = web::Data::new(config.clone());
    tracing::info!("Starting reel API server...");

    let db = web::Data::new(infrastructure::database::init_database(&config.database_url).await?);

    // One slot per user, shared by every worker
    let presence_registry = web::Data::new(WsPresenceRegistry::new());

    let server_addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", server_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Global rate limiter: 100 requests per minute per IP
        let per_ip_rate_limit = PerIpRateLimitMiddleware::new(100);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(per_ip_rate_limit)
            .wrap(AuthMiddleware)
            .app_data(db.clone())
            .app_data(config_data.clone())
            .app_data(presence_registry.clone())
            // Health (no auth required)
            .service(health::health_check)
            // Chat REST API
            .service(
                web::scope("/api/chats")
                    .service(chats::send_message)
                    .service(chats::list_conversations)
                    .service(chats::unread_count)
                    // keep after the literal routes
                    .service(chats::get_thread),
            )
            // Realtime
            .service(websocket_handler)
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
