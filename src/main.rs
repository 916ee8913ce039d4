// src/main.rs

use dotenvy::dotenv;
use mock_exam::config::Config;
use mock_exam::routes;
use mock_exam::state::AppState;
use mock_exam::utils::sample_bank::sample_bank;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "mock-exam.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let bank = sample_bank()?;
    tracing::info!(
        "Loaded sample paper with {} questions, exam duration {}s",
        bank.len(),
        config.exam_duration_secs
    );

    let addr = config.bind_addr;
    let state = AppState::new(bank, config);

    // Evict abandoned and finished sessions in the background
    state.spawn_session_sweeper();

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}
