//! Readwell - A lightweight social reading platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readwell::{
    api::{self, AppState, RequestStats},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SessionRepository, SqlxAuthorRepository, SqlxBookRepository, SqlxCommentRepository,
            SqlxFollowRepository, SqlxLibraryRepository, SqlxLikeRepository,
            SqlxNotificationRepository, SqlxPostRepository, SqlxReadingListRepository,
            SqlxReviewRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        CatalogService, LoginRateLimiter, NotificationService, PostService, ReadingListService,
        ReviewService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readwell=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Readwell...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = Arc::new(SqlxUserRepository::new(pool.clone()));
    let session_repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
    let follow_repo = Arc::new(SqlxFollowRepository::new(pool.clone()));
    let author_repo = Arc::new(SqlxAuthorRepository::new(pool.clone()));
    let book_repo = Arc::new(SqlxBookRepository::new(pool.clone()));
    let library_repo = Arc::new(SqlxLibraryRepository::new(pool.clone()));
    let review_repo = Arc::new(SqlxReviewRepository::new(pool.clone()));
    let reading_list_repo = Arc::new(SqlxReadingListRepository::new(pool.clone()));
    let post_repo = Arc::new(SqlxPostRepository::new(pool.clone()));
    let comment_repo = Arc::new(SqlxCommentRepository::new(pool.clone()));
    let like_repo = Arc::new(SqlxLikeRepository::new(pool.clone()));
    let notification_repo = Arc::new(SqlxNotificationRepository::new(pool.clone()));

    // Initialize services
    let user_service = Arc::new(
        UserService::new(
            user_repo.clone(),
            session_repo.clone(),
            follow_repo,
            notification_repo.clone(),
        )
        .with_session_expiration(config.auth.session_days),
    );
    let catalog_service = Arc::new(CatalogService::new(
        author_repo,
        book_repo.clone(),
        library_repo,
        user_repo,
        cache,
    ));
    let review_service = Arc::new(ReviewService::new(
        review_repo,
        book_repo.clone(),
        notification_repo.clone(),
    ));
    let reading_list_service = Arc::new(ReadingListService::new(reading_list_repo, book_repo));
    let post_service = Arc::new(PostService::new(
        post_repo,
        comment_repo,
        like_repo,
        notification_repo.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(notification_repo));

    let rate_limiter = Arc::new(LoginRateLimiter::new());
    let request_stats = Arc::new(RequestStats::new());

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        auth_config: config.auth.clone(),
        user_service,
        catalog_service,
        review_service,
        reading_list_service,
        post_service,
        notification_service,
        rate_limiter: rate_limiter.clone(),
        request_stats,
    };

    // Periodic cleanup: rate limiter windows and expired sessions
    {
        let limiter = rate_limiter.clone();
        let session_repo = session_repo.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                match session_repo.delete_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!("Purged {} expired sessions", purged),
                    Err(e) => tracing::warn!("Session cleanup failed: {:#}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
