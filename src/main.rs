//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod domain;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    let ticket_routes = Router::new()
        .route("/"
               ,post(handlers::tickets::create_ticket)
               .get(handlers::tickets::list_tickets)
        )
        .route("/{id}"
               ,get(handlers::tickets::get_ticket)
               .patch(handlers::tickets::update_ticket)
               .delete(handlers::tickets::delete_ticket)
        );

    let finance_routes = Router::new()
        .route("/transactions"
               ,post(handlers::finance::record_transaction)
               .get(handlers::finance::list_transactions)
        )
        .route("/transactions/{id}"
               ,get(handlers::finance::get_transaction)
               .delete(handlers::finance::delete_transaction)
        )
        .route("/summary", get(handlers::finance::get_summary));

    let loan_routes = Router::new()
        .route("/"
               ,post(handlers::loans::create_loan)
               .get(handlers::loans::list_loans)
        )
        // Chamado por cron externo; não há tarefas em background.
        .route("/overdue-sweep", post(handlers::loans::overdue_sweep))
        .route("/{id}"
               ,get(handlers::loans::get_loan)
               .delete(handlers::loans::delete_loan)
        )
        .route("/{id}/payments/{payment_id}", post(handlers::loans::record_payment));

    let charge_routes = Router::new()
        .route("/"
               ,post(handlers::charges::create_charge)
               .get(handlers::charges::list_charges)
        )
        .route("/sync", post(handlers::charges::sync_charges))
        .route("/{id}"
               ,patch(handlers::charges::update_charge)
               .delete(handlers::charges::delete_charge)
        );

    // Tudo abaixo de /api (menos o health) exige bearer token.
    let auth = axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/tickets", ticket_routes.layer(auth.clone()))
        .nest("/api/finance", finance_routes.layer(auth.clone()))
        .nest("/api/loans", loan_routes.layer(auth.clone()))
        .nest("/api/recurring-charges", charge_routes.layer(auth))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
