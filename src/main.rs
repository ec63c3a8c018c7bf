// region:    --- Imports
use auction_light::clock::{Clock, SystemClock};
use auction_light::collaborators::{HttpBlobStore, HttpIdentityVerifier};
use auction_light::config::AppConfig;
use auction_light::database::DatabaseManager;
use auction_light::handlers::{self, AppState};
use auction_light::message_broker::{KafkaManager, CHANGES_TOPIC};
use auction_light::notify::ChangeHub;
use auction_light::scheduler::LifecycleSweeper;
use auction_light::store::Stores;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new(&config.database_url, config.db_max_connections).await?);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성, 토픽 생성
    let hub = ChangeHub::default();
    let kafka_manager = KafkaManager::new(&config.kafka_brokers)?;
    if let Err(e) = kafka_manager.create_topic(CHANGES_TOPIC, 5, 1).await {
        // 브로커가 없어도 로컬 구독은 동작한다
        error!("{:<12} --> Kafka 토픽 생성 실패: {}", "Main", e);
    }
    let _bridge = kafka_manager.start_bridge(hub.clone())?;
    let notifier = Arc::new(kafka_manager.notifier(hub.clone()));
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let http = reqwest::Client::new();
    let state = AppState::new(
        Stores::from_single(Arc::clone(&db_manager)),
        Arc::new(HttpBlobStore::new(http.clone(), config.blob_store_url.clone())),
        Arc::new(HttpIdentityVerifier::new(http, config.verify_url.clone())),
        notifier.clone(),
        clock.clone(),
        &config.settings,
    );

    // 경매 종료 스케줄러
    let sweeper = LifecycleSweeper::new(
        db_manager.clone(),
        notifier,
        clock,
        config.settings.sweep_interval,
    );
    let _sweeper = sweeper.start();

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정 (사진 업로드를 위해 바디 크기 20MB)
    let routes_all = handlers::router(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
