/// Health endpoints: summary, readiness with component checks, liveness
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: BTreeMap<&'static str, ComponentCheck>,
    timestamp: String,
}

async fn database_reachable(state: &AppState) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(&state.db).await.map(|_| ())
}

/// GET /api/v1/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match database_reachable(&state).await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if database == "healthy" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

/// GET /api/v1/health/ready
///
/// PostgreSQL is critical (503 when down). Redis only degrades the
/// service since the cache is optional.
pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = BTreeMap::new();
    let mut overall = ComponentStatus::Healthy;

    let start = Instant::now();
    let postgres = match database_reachable(&state).await {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            overall = ComponentStatus::Unhealthy;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {e}"),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            }
        }
    };
    checks.insert("postgresql", postgres);

    let start = Instant::now();
    let redis = match state.cache.ping().await {
        None => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Redis not configured, caching disabled".to_string(),
            latency_ms: None,
        },
        Some(Ok(())) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Redis connection successful".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Some(Err(e)) => {
            if overall == ComponentStatus::Healthy {
                overall = ComponentStatus::Degraded;
            }
            ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("Redis unavailable: {e}"),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            }
        }
    };
    checks.insert("redis", redis);

    let ready = overall != ComponentStatus::Unhealthy;
    let response = ReadinessResponse {
        ready,
        status: overall,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        tracing::warn!("readiness check failed");
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// GET /api/v1/health/live
pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "alive": true }))
}
