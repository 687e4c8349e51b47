//! Screening requests raised for clients of Get Preventative Screenings.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::outcome::{ApiError, ApiResult, Resource};
use crate::records::{
    CaseRepository, ScreeningRequest, ScreeningRequestId, ScreeningStatus, UserId,
};
use crate::workflows::enrollment::domain::ScreeningKind;

pub struct ScreeningService<R> {
    repository: Arc<R>,
}

impl<R> ScreeningService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Record a new request and attach it to the user.
    pub fn create(&self, user_id: &UserId, name: ScreeningKind) -> ApiResult<ScreeningRequest> {
        let mut user = self
            .repository
            .find_user(user_id)
            .map_err(|err| ApiError::internal("failed to look up user", err))?
            .ok_or(ApiError::NotFound(Resource::User))?;

        let request = self
            .repository
            .insert_screening_request(ScreeningRequest {
                id: ScreeningRequestId::generate(),
                user: user_id.clone(),
                name,
                status: ScreeningStatus::Requested,
                submitted_date: Utc::now(),
            })
            .map_err(|err| {
                ApiError::from_repository(
                    "failed to create screening request",
                    Resource::ScreeningRequest,
                    err,
                )
            })?;

        user.screening_requests.push(request.id.clone());
        self.repository.update_user(user).map_err(|err| {
            ApiError::from_repository("failed to attach screening request", Resource::User, err)
        })?;

        info!(request_id = %request.id, screening = name.label(), "screening request created");
        Ok(request)
    }

    pub fn update(&self, request: ScreeningRequest) -> ApiResult<ScreeningRequest> {
        self.repository
            .update_screening_request(request)
            .map_err(|err| {
                ApiError::from_repository(
                    "failed to update screening request",
                    Resource::ScreeningRequest,
                    err,
                )
            })
    }

    pub fn update_status(
        &self,
        id: &ScreeningRequestId,
        status: ScreeningStatus,
    ) -> ApiResult<ScreeningRequest> {
        let mut request = self
            .repository
            .screening_requests()
            .map_err(|err| ApiError::internal("failed to load screening requests", err))?
            .into_iter()
            .find(|request| &request.id == id)
            .ok_or(ApiError::NotFound(Resource::ScreeningRequest))?;
        request.status = status;
        self.update(request)
    }

    /// Remove a request and detach it from its user.
    pub fn delete(&self, id: &ScreeningRequestId) -> ApiResult<()> {
        let removed = self.repository.delete_screening_request(id).map_err(|err| {
            ApiError::from_repository(
                "failed to delete screening request",
                Resource::ScreeningRequest,
                err,
            )
        })?;

        let user = self
            .repository
            .find_user(&removed.user)
            .map_err(|err| ApiError::internal("failed to look up user", err))?;
        if let Some(mut user) = user {
            user.screening_requests.retain(|attached| attached != id);
            self.repository.update_user(user).map_err(|err| {
                ApiError::from_repository("failed to detach screening request", Resource::User, err)
            })?;
        }

        info!(request_id = %id, "screening request deleted");
        Ok(())
    }

    pub fn for_user(&self, user_id: &UserId) -> ApiResult<Vec<ScreeningRequest>> {
        Ok(self
            .repository
            .screening_requests()
            .map_err(|err| ApiError::internal("failed to load screening requests", err))?
            .into_iter()
            .filter(|request| &request.user == user_id)
            .collect())
    }
}
