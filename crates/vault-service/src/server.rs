//! HTTP server for the storefront API.
//!
//! Exposes the storefront's view and actions as JSON under `/api`.

use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use vault_config::ApiConfig;
use vault_core::{PurchaseOutcome, Storefront, StorefrontError, StorefrontView};
use vault_gateway::GatewayError;
use vault_types::{ErrorResponse, PurchaseQuote, SelectPackageRequest};
use vault_wallet::ProviderEvent;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub storefront: Arc<Storefront>,
}

/// Error returned by API handlers.
pub struct ApiError(StorefrontError);

impl From<StorefrontError> for ApiError {
	fn from(err: StorefrontError) -> Self {
		ApiError(err)
	}
}

impl ApiError {
	fn status_and_code(&self) -> (StatusCode, &'static str) {
		match &self.0 {
			StorefrontError::UnknownPackage(_) => (StatusCode::BAD_REQUEST, "unknown_package"),
			StorefrontError::NoSelection => (StatusCode::CONFLICT, "no_selection"),
			StorefrontError::DataSourceUnavailable(_) => {
				(StatusCode::BAD_GATEWAY, "data_source_unavailable")
			},
			StorefrontError::Gateway(err) => match err {
				GatewayError::WalletUnavailable => {
					(StatusCode::SERVICE_UNAVAILABLE, "wallet_unavailable")
				},
				GatewayError::ContractUnavailable => {
					(StatusCode::SERVICE_UNAVAILABLE, "contract_unavailable")
				},
				GatewayError::NotConnected => (StatusCode::CONFLICT, "not_connected"),
				GatewayError::PurchaseInProgress => (StatusCode::CONFLICT, "purchase_in_progress"),
				GatewayError::PriceChanged { .. } => (StatusCode::CONFLICT, "price_changed"),
				GatewayError::ConnectSuperseded => (StatusCode::CONFLICT, "connect_superseded"),
				GatewayError::InvalidPurchase(_) => (StatusCode::BAD_REQUEST, "invalid_purchase"),
				GatewayError::NetworkMismatch { .. } => {
					(StatusCode::UNPROCESSABLE_ENTITY, "network_mismatch")
				},
				GatewayError::NoAccounts => (StatusCode::UNPROCESSABLE_ENTITY, "no_accounts"),
				GatewayError::TransactionRejected => {
					(StatusCode::UNPROCESSABLE_ENTITY, "transaction_rejected")
				},
				GatewayError::InsufficientFunds(_) => {
					(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
				},
				GatewayError::Reverted(_) => (StatusCode::UNPROCESSABLE_ENTITY, "reverted"),
				GatewayError::ConfirmationTimeout { .. } => {
					(StatusCode::BAD_GATEWAY, "confirmation_timeout")
				},
				GatewayError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, code) = self.status_and_code();
		let body = ErrorResponse::new(code, self.0.user_message());
		(status, Json(body)).into_response()
	}
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/storefront", get(handle_view))
				.route("/wallet/connect", post(handle_connect))
				.route("/wallet/disconnect", post(handle_disconnect))
				.route("/wallet/events", post(handle_provider_event))
				.route("/leads/refresh", post(handle_refresh_leads))
				.route("/purchase/select", post(handle_select))
				.route("/purchase/confirm", post(handle_confirm))
				.route("/purchase/cancel", post(handle_cancel)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	storefront: Arc<Storefront>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState { storefront }).layer(TimeoutLayer::new(Duration::from_secs(
		api_config.timeout_seconds,
	)));

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Storefront API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/storefront.
async fn handle_view(State(state): State<AppState>) -> Json<StorefrontView> {
	Json(state.storefront.view())
}

/// Handles POST /api/wallet/connect.
async fn handle_connect(State(state): State<AppState>) -> Result<Json<StorefrontView>, ApiError> {
	state.storefront.connect().await?;
	Ok(Json(state.storefront.view()))
}

/// Handles POST /api/wallet/disconnect.
async fn handle_disconnect(State(state): State<AppState>) -> Json<StorefrontView> {
	state.storefront.disconnect();
	Json(state.storefront.view())
}

/// Handles POST /api/wallet/events, used by wallet bridges to push
/// account and chain changes.
async fn handle_provider_event(
	State(state): State<AppState>,
	Json(event): Json<ProviderEvent>,
) -> Json<StorefrontView> {
	tracing::debug!(?event, "Provider event received");
	state.storefront.handle_provider_event(event);
	Json(state.storefront.view())
}

/// Handles POST /api/leads/refresh.
async fn handle_refresh_leads(
	State(state): State<AppState>,
) -> Result<Json<StorefrontView>, ApiError> {
	state.storefront.refresh_leads().await?;
	Ok(Json(state.storefront.view()))
}

/// Handles POST /api/purchase/select.
async fn handle_select(
	State(state): State<AppState>,
	Json(request): Json<SelectPackageRequest>,
) -> Result<Json<PurchaseQuote>, ApiError> {
	let quote = state.storefront.select_package(request.package_id).await?;
	Ok(Json(quote))
}

/// Handles POST /api/purchase/confirm.
async fn handle_confirm(State(state): State<AppState>) -> Result<Json<PurchaseOutcome>, ApiError> {
	match state.storefront.confirm_purchase().await {
		Ok(outcome) => Ok(Json(outcome)),
		Err(e) => {
			tracing::warn!("Purchase request failed: {}", e);
			Err(ApiError::from(e))
		},
	}
}

/// Handles POST /api/purchase/cancel.
async fn handle_cancel(State(state): State<AppState>) -> impl IntoResponse {
	let cancelled = state.storefront.cancel_purchase();
	Json(json!({ "cancelled": cancelled }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::{to_bytes, Body};
	use axum::http::Request;
	use serde_json::Value;
	use std::io::Write;
	use tempfile::NamedTempFile;
	use tower::ServiceExt;
	use vault_core::StorefrontSettings;
	use vault_gateway::testing::ScriptedWallet;
	use vault_gateway::{ChainGateway, GatewaySettings};
	use vault_leads::implementations::file::FileLeadsSource;
	use vault_types::{Address, ChainParams, NativeCurrency, U256};
	use vault_wallet::WalletProvider;

	const LEADS: &str = r#"{
		"prospects": [{"nom": "Ada", "handle": "ada_eth"}],
		"metadata": {"isLimited": false, "remainingLeads": 12}
	}"#;

	struct TestApp {
		app: Router,
		_leads_file: NamedTempFile,
	}

	fn test_app(with_wallet: bool) -> TestApp {
		let mut leads_file = NamedTempFile::new().unwrap();
		leads_file.write_all(LEADS.as_bytes()).unwrap();

		let wallet = with_wallet
			.then(|| Arc::new(ScriptedWallet::new(8453)) as Arc<dyn WalletProvider>);
		let gateway = Arc::new(ChainGateway::new(
			wallet,
			GatewaySettings {
				contract_address: Address::repeat_byte(0xcc),
				chain: ChainParams {
					chain_id: 8453,
					chain_name: "Base".to_string(),
					native_currency: NativeCurrency::default(),
					rpc_urls: vec!["https://mainnet.base.org".to_string()],
					block_explorer_urls: vec![],
				},
				confirmations: 1,
				confirmation_timeout: Duration::from_secs(30),
			},
		));
		let storefront = Storefront::new(
			gateway,
			Arc::new(FileLeadsSource::new(leads_file.path())),
			StorefrontSettings {
				post_connect_refresh_delay: Duration::ZERO,
				post_purchase_refresh_delay: Duration::ZERO,
				..StorefrontSettings::default()
			},
		);

		TestApp {
			app: router(AppState {
				storefront: Arc::new(storefront),
			}),
			_leads_file: leads_file,
		}
	}

	async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let mut builder = Request::builder().method(method).uri(uri);
		let body = match body {
			Some(json) => {
				builder = builder.header("content-type", "application/json");
				Body::from(json.to_string())
			},
			None => Body::empty(),
		};
		let response = app
			.clone()
			.oneshot(builder.body(body).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let json = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, json)
	}

	#[tokio::test]
	async fn test_view_before_connect() {
		let test = test_app(true);

		let (status, body) = send(&test.app, "GET", "/api/storefront", None).await;

		assert_eq!(status, StatusCode::OK);
		assert!(body["wallet"].is_null());
		assert_eq!(body["packages"].as_array().unwrap().len(), 3);
		assert_eq!(body["phase"], "disconnected");
	}

	#[tokio::test]
	async fn test_select_requires_connection() {
		let test = test_app(true);

		let (status, body) = send(
			&test.app,
			"POST",
			"/api/purchase/select",
			Some(json!({ "packageId": 1 })),
		)
		.await;

		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "not_connected");
		assert_eq!(
			body["message"],
			"Please connect your wallet first to purchase leads"
		);
	}

	#[tokio::test]
	async fn test_connect_without_wallet_is_unavailable() {
		let test = test_app(false);

		let (status, body) = send(&test.app, "POST", "/api/wallet/connect", None).await;

		assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(body["error"], "wallet_unavailable");
	}

	#[tokio::test]
	async fn test_full_purchase_flow() {
		let test = test_app(true);

		let (status, body) = send(&test.app, "POST", "/api/wallet/connect", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["leads"].as_array().unwrap().len(), 1);
		assert_eq!(body["access"]["kind"], "queued");

		let (status, quote) = send(
			&test.app,
			"POST",
			"/api/purchase/select",
			Some(json!({ "packageId": 2 })),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(quote["lead_count"], 25);
		assert_eq!(quote["total"], "25000000000000000");

		let (status, outcome) = send(&test.app, "POST", "/api/purchase/confirm", None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(outcome["receipt"]["lead_count"], 25);
		assert!(outcome["refresh_error"].is_null());

		let (status, _) = send(&test.app, "POST", "/api/purchase/confirm", None).await;
		assert_eq!(status, StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn test_unknown_package_and_cancel() {
		let test = test_app(true);
		send(&test.app, "POST", "/api/wallet/connect", None).await;

		let (status, body) = send(
			&test.app,
			"POST",
			"/api/purchase/select",
			Some(json!({ "packageId": 42 })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "unknown_package");

		send(
			&test.app,
			"POST",
			"/api/purchase/select",
			Some(json!({ "packageId": 1 })),
		)
		.await;
		let (_, body) = send(&test.app, "POST", "/api/purchase/cancel", None).await;
		assert_eq!(body["cancelled"], true);
		let (_, body) = send(&test.app, "POST", "/api/purchase/cancel", None).await;
		assert_eq!(body["cancelled"], false);
	}

	#[tokio::test]
	async fn test_wallet_event_disconnects() {
		let test = test_app(true);
		send(&test.app, "POST", "/api/wallet/connect", None).await;

		let (status, body) = send(
			&test.app,
			"POST",
			"/api/wallet/events",
			Some(json!({ "type": "disconnected" })),
		)
		.await;

		assert_eq!(status, StatusCode::OK);
		assert!(body["wallet"].is_null());
	}

	#[test]
	fn test_stale_quote_and_superseded_connect_are_conflicts() {
		let stale = ApiError(StorefrontError::Gateway(GatewayError::PriceChanged {
			quoted: U256::from(1),
			current: U256::from(2),
		}));
		assert_eq!(
			stale.status_and_code(),
			(StatusCode::CONFLICT, "price_changed")
		);

		let superseded = ApiError(StorefrontError::Gateway(GatewayError::ConnectSuperseded));
		assert_eq!(
			superseded.status_and_code(),
			(StatusCode::CONFLICT, "connect_superseded")
		);
	}

	#[test]
	fn test_rejection_message_is_neutral() {
		let rejected = ApiError(StorefrontError::Gateway(GatewayError::TransactionRejected));
		assert_eq!(
			rejected.status_and_code(),
			(StatusCode::UNPROCESSABLE_ENTITY, "transaction_rejected")
		);
		assert_eq!(
			rejected.0.user_message(),
			"Transaction was rejected by the wallet or the network"
		);
	}
}
