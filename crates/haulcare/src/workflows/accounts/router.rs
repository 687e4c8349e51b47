use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{
    AccountService, ClientQuery, ClientSortField, NewUser, PopulateOptions, SortOrder,
};
use super::session::{AdminSession, AuthenticatedSession, SharedSessions};
use crate::records::CaseRepository;
use crate::workflows::enrollment::programs::Program;

pub struct AccountsState<R> {
    pub accounts: Arc<AccountService<R>>,
    pub sessions: SharedSessions,
}

impl<R> Clone for AccountsState<R> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R> FromRef<AccountsState<R>> for SharedSessions {
    fn from_ref(state: &AccountsState<R>) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Router builder for login, account administration and the client list.
pub fn accounts_router<R>(accounts: Arc<AccountService<R>>) -> Router
where
    R: CaseRepository + 'static,
{
    let sessions: SharedSessions = accounts.clone();
    Router::new()
        .route("/api/auth/login", post(login_handler::<R>))
        .route("/api/auth/logout", post(logout_handler::<R>))
        .route("/api/users", get(list_clients_handler::<R>))
        .route(
            "/api/users/actions/create-admin-account",
            post(create_admin_handler::<R>),
        )
        .route(
            "/api/users/actions/change-password",
            post(change_password_handler::<R>),
        )
        .route(
            "/api/users/programs/:program",
            get(users_by_program_handler::<R>),
        )
        .with_state(AccountsState { accounts, sessions })
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub(crate) async fn login_handler<R>(
    State(state): State<AccountsState<R>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.accounts.authenticate(&request.email, &request.password) {
        Ok(issued) => (StatusCode::OK, Json(issued)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn logout_handler<R>(
    State(state): State<AccountsState<R>>,
    _session: AuthenticatedSession,
    headers: HeaderMap,
) -> Response
where
    R: CaseRepository + 'static,
{
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default()
        .trim();
    match state.accounts.logout(token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Raw `GET /api/users` parameters; camelCase names are accepted too.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<String>,
    pub search: Option<String>,
    #[serde(alias = "sortField")]
    pub sort_field: Option<String>,
    #[serde(alias = "sortOrder")]
    pub sort_order: Option<String>,
}

impl ClientListParams {
    pub fn into_query(self) -> ClientQuery {
        let defaults = ClientQuery::default();
        let number = |raw: Option<String>, fallback: usize| {
            raw.and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(fallback)
        };
        ClientQuery {
            page: number(self.page, defaults.page),
            page_size: number(self.page_size, defaults.page_size),
            search: self.search.unwrap_or_default(),
            sort_field: self
                .sort_field
                .as_deref()
                .map(ClientSortField::parse)
                .unwrap_or(defaults.sort_field),
            sort_order: self
                .sort_order
                .as_deref()
                .map(SortOrder::parse)
                .unwrap_or(defaults.sort_order),
            populate: PopulateOptions {
                populate_enrollment_form: true,
                populate_program_enrollments: true,
                populate_screening_requests: false,
            },
        }
    }
}

pub(crate) async fn list_clients_handler<R>(
    State(state): State<AccountsState<R>>,
    _admin: AdminSession,
    Query(params): Query<ClientListParams>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.accounts.paginated_clients(&params.into_query()) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(_) => {
            let payload = json!({ "error": "Internal server error" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_admin_handler<R>(
    State(state): State<AccountsState<R>>,
    _admin: AdminSession,
    Json(request): Json<NewUser>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.accounts.create_admin_user(request) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

pub(crate) async fn change_password_handler<R>(
    State(state): State<AccountsState<R>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Json(request): Json<ChangePasswordRequest>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.accounts.change_password(
        &session,
        &request.email,
        &request.old_password,
        &request.new_password,
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn users_by_program_handler<R>(
    State(state): State<AccountsState<R>>,
    _admin: AdminSession,
    Path(program): Path<Program>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.accounts.users_by_program(program) {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))).into_response(),
        Err(err) => err.into_response(),
    }
}
