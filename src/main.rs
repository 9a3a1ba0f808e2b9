use anyhow::Result;
use tracing::info;

use foundation_backend::config::Config;
use foundation_backend::db::Database;
use foundation_backend::email::Mailer;
use foundation_backend::notify::Notifier;
use foundation_backend::payments::PaymentGateway;
use foundation_backend::routes::{self, AppState};
use foundation_backend::whatsapp::WhatsAppClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("foundation_backend=info".parse()?),
        )
        .init();

    info!("Starting foundation backend");

    // Load configuration from environment; missing credentials fail here
    let config = Config::from_env()?;

    // Database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    info!("Database ready");

    // External clients, constructed once and injected into handlers
    let mailer = Mailer::new(
        &config.email_api_base,
        &config.email_api_key,
        &config.email_from,
    );
    let whatsapp = WhatsAppClient::new(
        &config.twilio_api_base,
        &config.twilio_account_sid,
        &config.twilio_auth_token,
        &config.twilio_whatsapp_from,
    );
    let payments = PaymentGateway::new(
        &config.razorpay_api_base,
        &config.razorpay_key_id,
        &config.razorpay_key_secret,
    );

    // Background notification workers
    let notifier = Notifier::start(
        mailer,
        whatsapp,
        config.notify_queue_size,
        config.notify_workers,
    );

    let state = AppState {
        db,
        notifier,
        payments,
        config: config.clone(),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
