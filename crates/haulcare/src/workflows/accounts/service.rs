use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::outcome::{ApiError, ApiResult, Resource};
use crate::records::{
    CaseRepository, EnrollmentFormRecord, EnrollmentStatus, ProgramEnrollment, Role,
    ScreeningRequest, User, UserId,
};
use crate::workflows::enrollment::programs::Program;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 12;

/// Details needed to open an account.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Related records to load alongside a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateOptions {
    pub populate_enrollment_form: bool,
    pub populate_program_enrollments: bool,
    pub populate_screening_requests: bool,
}

impl PopulateOptions {
    pub const fn all() -> Self {
        Self {
            populate_enrollment_form: true,
            populate_program_enrollments: true,
            populate_screening_requests: true,
        }
    }
}

/// A user with whichever related records were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_form_record: Option<EnrollmentFormRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_enrollment_records: Option<Vec<ProgramEnrollment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening_request_records: Option<Vec<ScreeningRequest>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSortField {
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    DateCreated,
}

impl ClientSortField {
    /// Unknown names fall back to last name.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "first_name" | "firstName" => ClientSortField::FirstName,
            "email" => ClientSortField::Email,
            "phone_number" | "phoneNumber" => ClientSortField::PhoneNumber,
            "date_created" | "dateCreated" => ClientSortField::DateCreated,
            _ => ClientSortField::LastName,
        }
    }

    fn compare(self, left: &User, right: &User) -> Ordering {
        let by_text = |a: &str, b: &str| a.to_lowercase().cmp(&b.to_lowercase());
        match self {
            ClientSortField::FirstName => by_text(&left.first_name, &right.first_name),
            ClientSortField::LastName => by_text(&left.last_name, &right.last_name),
            ClientSortField::Email => by_text(&left.email, &right.email),
            ClientSortField::PhoneNumber => left.phone_number.cmp(&right.phone_number),
            ClientSortField::DateCreated => left.date_created.cmp(&right.date_created),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientQuery {
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub sort_field: ClientSortField,
    pub sort_order: SortOrder,
    pub populate: PopulateOptions,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 10,
            search: String::new(),
            sort_field: ClientSortField::LastName,
            sort_order: SortOrder::Asc,
            populate: PopulateOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPage {
    pub clients: Vec<UserProfile>,
    pub count: usize,
}

/// Accounts, credentials and login sessions.
pub struct AccountService<R> {
    repository: Arc<R>,
    bcrypt_cost: u32,
    session_lifetime: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl<R> AccountService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>, bcrypt_cost: u32) -> Self {
        Self {
            repository,
            bcrypt_cost,
            session_lifetime: Duration::hours(DEFAULT_SESSION_LIFETIME_HOURS),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Sessions held in memory, expired ones included until the next sweep.
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .map(|sessions| sessions.len())
            .unwrap_or_default()
    }

    pub fn create_admin_user(&self, request: NewUser) -> ApiResult<User> {
        self.create_user(request, Role::Admin, true)
    }

    pub fn create_client_user(&self, request: NewUser) -> ApiResult<User> {
        self.create_user(request, Role::Client, false)
    }

    fn create_user(&self, request: NewUser, role: Role, verified: bool) -> ApiResult<User> {
        let email = request.email.trim().to_ascii_lowercase();
        let existing = self
            .repository
            .find_user_by_email(&email)
            .map_err(|err| ApiError::internal("failed to look up user", err))?;
        if existing.is_some() {
            return Err(ApiError::Duplicate);
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = User {
            id: UserId::generate(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email,
            phone_number: request.phone_number.trim().to_string(),
            password_hash,
            role,
            date_created: Utc::now(),
            is_email_verified: verified,
            enrollment_form: None,
            program_enrollments: Vec::new(),
            screening_requests: Vec::new(),
        };

        let stored = self
            .repository
            .insert_user(user)
            .map_err(|err| ApiError::from_repository("failed to create user", Resource::User, err))?;
        info!(user_id = %stored.id, role = ?stored.role, "user created");
        Ok(stored)
    }

    /// Verify credentials and open a session.
    pub fn authenticate(&self, email: &str, password: &str) -> ApiResult<IssuedSession> {
        let user = self
            .repository
            .find_user_by_email(email)
            .map_err(|err| ApiError::internal("failed to look up user", err))?
            .ok_or(ApiError::InvalidCredentials)?;
        if !self.verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "rejected login attempt");
            return Err(ApiError::InvalidCredentials);
        }

        let now = Utc::now();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            expires_at: now + self.session_lifetime,
        };
        let issued = IssuedSession {
            token: token.clone(),
            role: session.role,
            expires_at: session.expires_at,
        };
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|err| ApiError::internal("session store unavailable", err))?;
        sessions.retain(|_, open| open.expires_at > now);
        sessions.insert(token, session);
        drop(sessions);
        info!(user_id = %user.id, "session opened");
        Ok(issued)
    }

    /// Resolve a bearer token to its live session.
    pub fn session(&self, token: &str) -> ApiResult<Session> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|err| ApiError::internal("session store unavailable", err))?;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.clone()),
            Some(_) => {
                sessions.remove(token);
                Err(ApiError::Unauthorized)
            }
            None => Err(ApiError::Unauthorized),
        }
    }

    pub fn logout(&self, token: &str) -> ApiResult<()> {
        self.sessions
            .lock()
            .map_err(|err| ApiError::internal("session store unavailable", err))?
            .remove(token);
        Ok(())
    }

    pub fn get_user_by_email(&self, email: &str, options: PopulateOptions) -> ApiResult<UserProfile> {
        let user = self
            .repository
            .find_user_by_email(email)
            .map_err(|err| ApiError::internal("failed to look up user", err))?
            .ok_or(ApiError::NotFound(Resource::User))?;
        self.populate(user, options)
    }

    /// Replace the password of the session's own account.
    pub fn change_password(
        &self,
        session: &Session,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        if old_password.len() < MIN_PASSWORD_LENGTH || new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::InvalidCredentials);
        }
        if !session.email.eq_ignore_ascii_case(email.trim()) {
            return Err(ApiError::InvalidCredentials);
        }

        let mut user = self
            .repository
            .find_user_by_email(email)
            .map_err(|err| ApiError::internal("failed to look up user", err))?
            .ok_or(ApiError::NotFound(Resource::User))?;
        if !self.verify_password(old_password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        user.password_hash = self.hash_password(new_password)?;
        let user_id = user.id.clone();
        self.repository.update_user(user).map_err(|err| {
            ApiError::from_repository("failed to update password", Resource::User, err)
        })?;
        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// One page of client accounts matching `query.search`, plus the total match count.
    pub fn paginated_clients(&self, query: &ClientQuery) -> ApiResult<ClientPage> {
        let needle = query.search.trim().to_lowercase();
        let mut clients: Vec<User> = self
            .repository
            .users()
            .map_err(|err| ApiError::internal("failed to load clients", err))?
            .into_iter()
            .filter(|user| user.role == Role::Client)
            .filter(|user| {
                needle.is_empty()
                    || user.first_name.to_lowercase().contains(&needle)
                    || user.last_name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .collect();

        clients.sort_by(|left, right| {
            let ordering = query.sort_field.compare(left, right);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let count = clients.len();
        let clients = clients
            .into_iter()
            .skip(query.page.saturating_mul(query.page_size))
            .take(query.page_size)
            .map(|user| self.populate(user, query.populate))
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(ClientPage { clients, count })
    }

    /// Users holding an accepted enrollment in `program`.
    pub fn users_by_program(&self, program: Program) -> ApiResult<Vec<User>> {
        let enrollments = self
            .repository
            .program_enrollments()
            .map_err(|err| ApiError::internal("failed to load program enrollments", err))?;

        let mut users = Vec::new();
        for enrollment in enrollments.iter().filter(|enrollment| {
            enrollment.program == program && enrollment.status == EnrollmentStatus::Accepted
        }) {
            let user = self
                .repository
                .find_user_by_email(&enrollment.email)
                .map_err(|err| ApiError::internal("failed to look up user", err))?;
            if let Some(user) = user {
                if !users.iter().any(|known: &User| known.id == user.id) {
                    users.push(user);
                }
            }
        }
        Ok(users)
    }

    fn populate(&self, user: User, options: PopulateOptions) -> ApiResult<UserProfile> {
        let enrollment_form_record = if options.populate_enrollment_form {
            let found = match &user.enrollment_form {
                Some(id) => self.repository.find_enrollment_form(id),
                None => self.repository.find_enrollment_form_by_email(&user.email),
            };
            found.map_err(|err| ApiError::internal("failed to load enrollment form", err))?
        } else {
            None
        };

        let program_enrollment_records = if options.populate_program_enrollments {
            let records = self
                .repository
                .program_enrollments()
                .map_err(|err| ApiError::internal("failed to load program enrollments", err))?
                .into_iter()
                .filter(|enrollment| enrollment.email.eq_ignore_ascii_case(&user.email))
                .collect();
            Some(records)
        } else {
            None
        };

        let screening_request_records = if options.populate_screening_requests {
            let records = self
                .repository
                .screening_requests()
                .map_err(|err| ApiError::internal("failed to load screening requests", err))?
                .into_iter()
                .filter(|request| request.user == user.id)
                .collect();
            Some(records)
        } else {
            None
        };

        Ok(UserProfile {
            user,
            enrollment_form_record,
            program_enrollment_records,
            screening_request_records,
        })
    }

    fn hash_password(&self, password: &str) -> ApiResult<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|err| ApiError::internal("failed to hash password", err))
    }

    fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        bcrypt::verify(password, hash)
            .map_err(|err| ApiError::internal("failed to verify password", err))
    }
}
