//! User accounts, bearer sessions and the admin client list.

pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use router::{accounts_router, AccountsState, ClientListParams};
pub use service::{
    AccountService, ClientPage, ClientQuery, ClientSortField, IssuedSession, NewUser,
    PopulateOptions, Session, SortOrder, UserProfile, MIN_PASSWORD_LENGTH,
};
pub use session::{AdminSession, AuthenticatedSession, SessionError, SessionVerifier, SharedSessions};
