use anyhow::Result;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tracing::{error, warn};

use crate::chain::{same_address, ChainClient};
use crate::evaluation::{EvaluationOutcome, SongEvaluator};
use crate::user::{AuthTokenValue, MintInsertOutcome, MintRecord, UserManager, UserStore};
use axum_extra::extract::cookie::{Cookie, SameSite};

use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::{header, response, HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::{log_requests, metrics, state::*, ServerConfig};
use crate::server::session::Session;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Serialize)]
struct NonceResponse {
    nonce: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RecordMintBody {
    pub transaction_hash: Option<String>,
    pub contract_address: Option<String>,
    pub token_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VerifyWalletBody {
    pub message: Option<String>,
    pub signature: Option<String>,
}

#[derive(Serialize)]
struct MintRecordedResponse {
    status: &'static str,
    data: MintRecord,
    message: &'static str,
}

#[derive(Serialize)]
struct MintRecordsResponse {
    status: &'static str,
    data: Vec<MintRecord>,
}

#[derive(Serialize)]
struct WalletLinkedResponse {
    status: &'static str,
    address: String,
    message: &'static str,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let login_result = user_manager
        .lock()
        .unwrap()
        .login(&body.user_handle, &body.password);

    match login_result {
        Ok(Some(auth_token)) => {
            metrics::record_login_attempt(true);
            let response_body = LoginSuccessResponse {
                token: auth_token.value.0.clone(),
            };
            let response_body = serde_json::to_string(&response_body).unwrap();

            let cookie_value = HeaderValue::from_str(&format!(
                "session_token={}; Path=/; HttpOnly",
                auth_token.value.0
            ))
            .unwrap();
            response::Builder::new()
                .status(StatusCode::CREATED)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::SET_COOKIE, cookie_value)
                .body(Body::from(response_body))
                .unwrap()
        }
        Ok(None) => {
            metrics::record_login_attempt(false);
            error_response(StatusCode::UNAUTHORIZED, "Invalid credentials")
        }
        Err(err) => {
            error!("Error during login: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    let deleted = user_manager
        .lock()
        .unwrap()
        .delete_auth_token(&AuthTokenValue(session.token));
    match deleted {
        Ok(true) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Ok(false) => error_response(StatusCode::BAD_REQUEST, "Unknown session"),
        Err(err) => {
            error!("Error deleting auth token: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Logout failed")
        }
    }
}

/// Issues a random nonce for clients building sign-in messages. Nonces are
/// not persisted; replay protection is left to message timestamps.
async fn get_nonce() -> impl IntoResponse {
    Json(NonceResponse {
        nonce: uuid::Uuid::new_v4().to_string(),
    })
}

async fn evaluate_song(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, "Expected multipart form data");
        }
    };

    let mut song: Option<(Option<String>, axum::body::Bytes)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("songFile") {
                    let content_type = field.content_type().map(|s| s.to_string());
                    match field.bytes().await {
                        Ok(bytes) => song = Some((content_type, bytes)),
                        Err(err) => {
                            warn!("Failed to read songFile field: {}", err);
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                "Failed to read songFile field",
                            );
                        }
                    }
                } else {
                    // Drain unrelated fields
                    let _ = field.bytes().await;
                }
            }
            Ok(None) => break,
            Err(_) => {
                return error_response(StatusCode::BAD_REQUEST, "Malformed multipart form data");
            }
        }
    }

    let Some((content_type, bytes)) = song else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing or invalid songFile in form data",
        );
    };
    if bytes.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Uploaded songFile is empty");
    }

    let started = Instant::now();
    let (report, outcome) = state
        .evaluator
        .evaluate(&bytes, content_type.as_deref())
        .await;

    match &outcome {
        EvaluationOutcome::Model { .. } => metrics::record_evaluation("model", started.elapsed()),
        EvaluationOutcome::Fallback { cause } => {
            metrics::record_evaluation("fallback", started.elapsed());
            metrics::record_evaluation_fallback(cause);
        }
    }

    Json(report).into_response()
}

async fn record_mint(
    session: Session,
    State(state): State<ServerState>,
    body: Result<Json<RecordMintBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let (Some(transaction_hash), Some(contract_address)) =
        (body.transaction_hash, body.contract_address)
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing transaction hash or contract address",
        );
    };

    // Independently verify the transaction before recording anything
    let receipt = match state.chain.transaction_receipt(&transaction_hash).await {
        Ok(Some(receipt)) => receipt,
        Ok(None) => {
            metrics::record_mint_result("rejected");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to verify transaction on blockchain",
            );
        }
        Err(err) => {
            warn!("Blockchain verification error: {}", err);
            metrics::record_mint_result("rejected");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to verify transaction on blockchain",
            );
        }
    };

    if !receipt.is_success() {
        metrics::record_mint_result("rejected");
        return error_response(StatusCode::BAD_REQUEST, "Transaction failed on-chain");
    }

    let contract_matches = receipt
        .to
        .as_deref()
        .map(|to| same_address(to, &contract_address))
        .unwrap_or(false);
    if !contract_matches {
        metrics::record_mint_result("rejected");
        return error_response(StatusCode::BAD_REQUEST, "Contract address mismatch");
    }

    let user_manager = state.user_manager.lock().unwrap();

    let Some(wallet_address) = user_manager.wallet_address(session.user_id) else {
        metrics::record_mint_result("rejected");
        return error_response(
            StatusCode::BAD_REQUEST,
            "User profile not found or wallet not linked",
        );
    };

    if !same_address(&receipt.from, &wallet_address) {
        metrics::record_mint_result("rejected");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Transaction sender does not match user wallet",
        );
    }

    match user_manager.record_mint(
        session.user_id,
        &transaction_hash,
        &contract_address,
        body.token_id.as_deref(),
    ) {
        Ok(MintInsertOutcome::Recorded(record)) => {
            metrics::record_mint_result("recorded");
            (
                StatusCode::OK,
                Json(MintRecordedResponse {
                    status: "ok",
                    data: record,
                    message: "Mint successfully recorded",
                }),
            )
                .into_response()
        }
        Ok(MintInsertOutcome::Duplicate) => {
            metrics::record_mint_result("duplicate");
            error_response(
                StatusCode::CONFLICT,
                "This transaction has already been recorded",
            )
        }
        Err(err) => {
            error!("Error recording mint: {}", err);
            metrics::record_mint_result("error");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record mint")
        }
    }
}

async fn get_mint_records(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> Response {
    match user_manager.lock().unwrap().mint_records(session.user_id) {
        Ok(records) => Json(MintRecordsResponse {
            status: "ok",
            data: records,
        })
        .into_response(),
        Err(err) => {
            error!("Error loading mint records: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load mint records",
            )
        }
    }
}

async fn verify_wallet(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<VerifyWalletBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let (Some(message), Some(signature)) = (body.message, body.signature) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing message or signature");
    };

    let siwe_message: crate::siwe::SiweMessage = match message.parse() {
        Ok(message) => message,
        Err(err) => {
            warn!("Error parsing SIWE message: {}", err);
            return error_response(StatusCode::BAD_REQUEST, "Failed to verify signature");
        }
    };

    let address = match siwe_message.verify(&signature) {
        Ok(address) => address.to_string(),
        Err(err) => {
            warn!("SIWE signature rejected: {}", err);
            return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    };

    match user_manager
        .lock()
        .unwrap()
        .link_wallet(session.user_id, &address)
    {
        Ok(()) => Json(WalletLinkedResponse {
            status: "ok",
            address,
            message: "Wallet successfully linked to your profile",
        })
        .into_response(),
        Err(err) => {
            error!("Error linking wallet: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update profile")
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        user_manager: UserManager,
        evaluator: Arc<SongEvaluator>,
        chain: Arc<dyn ChainClient>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager: Arc::new(Mutex::new(user_manager)),
            evaluator,
            chain,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

fn cors_layer() -> CorsLayer {
    // Matches the browser clients: wildcard origin, fixed header allowlist
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn make_app(
    config: ServerConfig,
    user_store: Arc<dyn UserStore>,
    evaluator: Arc<SongEvaluator>,
    chain: Arc<dyn ChainClient>,
) -> Result<Router> {
    let user_manager = UserManager::new(user_store);
    let state = ServerState::new(config.clone(), user_manager, evaluator, chain);

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/nonce", get(get_nonce))
        .with_state(state.clone());

    let song_routes: Router = Router::new()
        .route("/evaluate", post(evaluate_song))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state.clone());

    let wallet_routes: Router = Router::new()
        .route("/verify", post(verify_wallet))
        .with_state(state.clone());

    let mint_routes: Router = Router::new()
        .route("/record", post(record_mint))
        .route("/records", get(get_mint_records))
        .with_state(state.clone());

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/auth", auth_routes)
        .nest("/v1/song", song_routes)
        .nest("/v1/wallet", wallet_routes)
        .nest("/v1/mint", mint_routes)
        .layer(cors_layer())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    user_store: Arc<dyn UserStore>,
    evaluator: Arc<SongEvaluator>,
    chain: Arc<dyn ChainClient>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_store, evaluator, chain)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
