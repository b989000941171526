#![warn(clippy::pedantic)]

mod error;
mod extract;
mod image;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	cors::CorsLayer, request_id::MakeRequestUuid, trace::TraceLayer, ServiceBuilderExt,
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::AppError;

pub type SharedStore = Arc<dyn store::Store>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers only see the persistence port and the image store, so either
/// can be substituted; the test suite swaps the Postgres store for the
/// in-memory one and the public directory for a temporary one.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: SharedStore,
	pub images: image::ImageStore,
}

/// Builds the application router over the given state.
pub fn app(state: State) -> Router {
	aide::gen::on_error(|error| {
		tracing::error!(%error, "openapi generation error");
	});
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/posts", route::post::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.set_x_request_id(MakeRequestUuid)
				.layer(TraceLayer::new_for_http())
				.propagate_x_request_id()
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() {
	tracing_subscriber::registry()
		.with(LevelFilter::from_level(Level::INFO))
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();

	dotenvy::dotenv().ok();

	let store: SharedStore = match std::env::var("DATABASE_URL") {
		Ok(url) => Arc::new(
			store::postgres::PostgresStore::connect(&url)
				.await
				.expect("failed to connect to database"),
		),
		Err(_) => {
			tracing::warn!("DATABASE_URL is not set, falling back to the in-memory store");

			Arc::new(store::memory::MemoryStore::new())
		}
	};

	let public_root = std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into());

	let state = State {
		store,
		images: image::ImageStore::new(public_root),
	};

	let governor = ratelimit::default();
	ratelimit::cleanup_old_limits(&[&governor]);

	let app = app(state).layer(GovernorLayer { config: governor });

	let port = std::env::var("PORT").map_or_else(
		|_| 3000,
		|port| port.parse().expect("PORT must be a number"),
	);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(listener, app).await.unwrap();
}
