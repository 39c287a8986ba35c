use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use strak_api::cache::ContentCache;
use strak_api::config::{Config, SERVICE_NAME};
use strak_api::middleware::MetricsMiddleware;
use strak_api::routes;
use strak_api::services::MediaStore;
use strak_api::AppState;

const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,sqlx=warn";

/// `strak-api healthcheck` probes the local liveness endpoint for container
/// health checks and exits non-zero on failure.
async fn run_healthcheck() -> io::Result<()> {
    let port = std::env::var("STRAK_PORT").unwrap_or_else(|_| "8080".to_string());
    let mut stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{port}")).await?;
    stream
        .write_all(b"GET /api/v1/health/live HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    let status_line = String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();

    if status_line.split_whitespace().nth(1) == Some("200") {
        Ok(())
    } else {
        eprintln!("healthcheck HTTP status: {status_line}");
        Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn connect_cache(config: &Config) -> ContentCache {
    let Some(url) = config.cache.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set, caching disabled");
        return ContentCache::disabled();
    };

    let manager = match redis::Client::open(url) {
        Ok(client) => redis::aio::ConnectionManager::new(client).await,
        Err(e) => Err(e),
    };

    match manager {
        Ok(manager) => {
            tracing::info!(ttl_secs = config.cache.ttl_secs, "Redis cache connected");
            ContentCache::new(manager, config.cache.ttl_secs)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, continuing without cache");
            ContentCache::disabled()
        }
    }
}

fn build_cors(config: &Config) -> Cors {
    let mut cors = Cors::default();
    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        service = SERVICE_NAME,
        env = %config.app.env,
        version = env!("CARGO_PKG_VERSION"),
        "Starting service"
    );

    crypto_core::jwt::initialize_jwt_keys(&config.jwt.private_key_pem, &config.jwt.public_key_pem)
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Failed to initialize JWT keys: {e}"),
            )
        })?;

    config.database.log_config();
    let db_pool = match db_pool::create_pool(config.database.clone()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database pool creation failed");
            eprintln!("ERROR: Failed to create database pool: {e}");
            std::process::exit(1);
        }
    };

    if config.app.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;
        tracing::info!("Database migrations applied");
    }

    let cache = connect_cache(&config).await;

    let media = MediaStore::new(&config.media);
    media.ensure_root().await.map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to create media root {}: {e}", config.media.root.display()),
        )
    })?;

    let state = web::Data::new(AppState::new(db_pool.clone(), cache, media));
    let bind_address = config.bind_address();
    tracing::info!(address = %bind_address, workers = config.app.workers, "Starting HTTP server");

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(build_cors(&server_config))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure(db_pool.clone()))
            .default_service(web::route().to(routes::not_found))
    })
    .workers(config.app.workers)
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;
    tracing::info!("Server stopped");
    Ok(())
}
