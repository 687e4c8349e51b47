use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::records::InMemoryCaseRepository;
use crate::workflows::accounts::service::{AccountService, NewUser};

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub(super) const TEST_BCRYPT_COST: u32 = 4;
pub(super) const PASSWORD: &str = "long-haul-2024";

pub(super) fn service() -> (
    Arc<InMemoryCaseRepository>,
    Arc<AccountService<InMemoryCaseRepository>>,
) {
    let repository = Arc::new(InMemoryCaseRepository::new());
    let service = Arc::new(AccountService::new(
        Arc::clone(&repository),
        TEST_BCRYPT_COST,
    ));
    (repository, service)
}

pub(super) fn new_user(first_name: &str, last_name: &str, email: &str) -> NewUser {
    NewUser {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        phone_number: "4175550100".to_string(),
        password: PASSWORD.to_string(),
    }
}

/// An admin account plus a live bearer token for it.
pub(super) fn admin_token(service: &AccountService<InMemoryCaseRepository>) -> String {
    service
        .create_admin_user(new_user("Ruth", "Okafor", "ruth@haulcare.org"))
        .expect("admin created");
    service
        .authenticate("ruth@haulcare.org", PASSWORD)
        .expect("admin logs in")
        .token
}

pub(super) fn seed_clients(service: &AccountService<InMemoryCaseRepository>) {
    for (first, last, email) in [
        ("Marcus", "Hale", "marcus@example.org"),
        ("Dana", "Reyes", "dana@example.org"),
        ("Lou", "Abbott", "lou@example.org"),
        ("Tasha", "Young", "tasha@fleetmail.com"),
    ] {
        service
            .create_client_user(new_user(first, last, email))
            .expect("client created");
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
