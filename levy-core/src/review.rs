//! Calculation history and the officer review queue.
//!
//! Citizens save calculations to their history or submit them for review.
//! An officer approves a submitted request, which re-runs the calculation
//! against the slabs configured for the request's fiscal year and files the
//! result under the citizen, or rejects it. The status change is guarded,
//! so of two officers deciding the same request only one succeeds. Officer
//! actions are written to the audit log on a best-effort basis: a failed
//! audit write is logged and does not undo the action.

use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::calculations::{ProgressiveTaxEngine, TaxResult};
use crate::db::{LevyRepository, RepositoryError};
use crate::models::{
    ActivityType, CitizenProfile, NewOfficerActivity, NewTaxCalculation, NewTaxRequest,
    ProfileError, TaxCalculation, TaxRequest, TaxRequestStatus, validate_tin,
};
use crate::slabs::{SlabResolutionError, resolve_slab_table};

/// How many submitted requests the queue shows when no limit is given.
pub const DEFAULT_QUEUE_LIMIT: u32 = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Slabs(#[from] SlabResolutionError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("request {id} is {from} and cannot be {to}")]
    InvalidTransition {
        id: i64,
        from: TaxRequestStatus,
        to: TaxRequestStatus,
    },
}

/// Outcome of approving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub request: TaxRequest,
    pub calculation: TaxCalculation,
}

/// Review operations against a repository.
pub struct ReviewWorkflow<'a> {
    repo: &'a dyn LevyRepository,
    engine: &'a ProgressiveTaxEngine,
}

impl<'a> ReviewWorkflow<'a> {
    pub fn new(
        repo: &'a dyn LevyRepository,
        engine: &'a ProgressiveTaxEngine,
    ) -> Self {
        Self { repo, engine }
    }

    /// Saves a calculator result to `user_id`'s history.
    pub async fn save_history(
        &self,
        user_id: &str,
        result: &TaxResult,
    ) -> Result<TaxCalculation, ReviewError> {
        let saved = self
            .repo
            .create_calculation(NewTaxCalculation::from_result(user_id, result))
            .await?;
        info!(user_id, calculation_id = saved.id, "saved calculation");
        Ok(saved)
    }

    /// Files a calculator result for officer review.
    pub async fn submit_request(
        &self,
        citizen_id: &str,
        result: &TaxResult,
    ) -> Result<TaxRequest, ReviewError> {
        let request = self
            .repo
            .create_request(NewTaxRequest::submitted(citizen_id, result))
            .await?;
        info!(citizen_id, request_id = request.id, "submitted review request");
        Ok(request)
    }

    /// Submitted requests, newest first.
    pub async fn pending_requests(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TaxRequest>, ReviewError> {
        Ok(self
            .repo
            .list_requests(
                Some(TaxRequestStatus::Submitted),
                Some(limit.unwrap_or(DEFAULT_QUEUE_LIMIT)),
            )
            .await?)
    }

    /// Approves a submitted request.
    ///
    /// The tax is recomputed from the request's stored totals; the figures
    /// the citizen submitted are not trusted. The new calculation is owned
    /// by the citizen and points back at the request.
    ///
    /// # Errors
    ///
    /// * [`ReviewError::InvalidTransition`] if the request is not `submitted`,
    ///   including when another officer decides it first.
    /// * [`ReviewError::Slabs`] if the stored slabs for the fiscal year are
    ///   malformed.
    pub async fn approve_request(
        &self,
        officer_id: &str,
        request_id: i64,
        note: Option<&str>,
    ) -> Result<Approval, ReviewError> {
        let request = self.repo.get_request(request_id).await?;
        Self::check_transition(&request, TaxRequestStatus::Approved)?;

        let table = resolve_slab_table(self.repo, &request.fiscal_year).await?;
        let result = self.engine.calculate(
            request.total_income,
            request.total_expense,
            Some(&request.fiscal_year),
            table.as_ref(),
        );

        let mut record = NewTaxCalculation::from_result(request.citizen_id.clone(), &result);
        record.officer_id = Some(officer_id.to_string());
        record.source_request_id = Some(request.id);
        let (request, calculation) = self
            .repo
            .record_approval(request.id, officer_id, note, record)
            .await
            .map_err(|e| Self::transition_error(e, TaxRequestStatus::Approved))?;

        info!(
            officer_id,
            request_id,
            calculation_id = calculation.id,
            calculated_tax = %calculation.calculated_tax,
            "approved review request"
        );

        self.audit(NewOfficerActivity {
            officer_id: officer_id.to_string(),
            activity_type: ActivityType::RequestApproved,
            target_user_id: Some(request.citizen_id.clone()),
            description: format!("Approved tax review request {request_id}"),
            metadata: json!({
                "request_id": request_id,
                "calculation_id": calculation.id,
                "calculated_tax": calculation.calculated_tax.to_string(),
            }),
        })
        .await;

        Ok(Approval {
            request,
            calculation,
        })
    }

    /// Rejects a submitted request.
    pub async fn reject_request(
        &self,
        officer_id: &str,
        request_id: i64,
        note: Option<&str>,
    ) -> Result<TaxRequest, ReviewError> {
        let request = self.repo.get_request(request_id).await?;
        Self::check_transition(&request, TaxRequestStatus::Rejected)?;

        let request = self
            .repo
            .update_request_status(
                request.id,
                TaxRequestStatus::Submitted,
                TaxRequestStatus::Rejected,
                Some(officer_id),
                note,
            )
            .await
            .map_err(|e| Self::transition_error(e, TaxRequestStatus::Rejected))?;

        info!(officer_id, request_id, "rejected review request");

        self.audit(NewOfficerActivity {
            officer_id: officer_id.to_string(),
            activity_type: ActivityType::RequestRejected,
            target_user_id: Some(request.citizen_id.clone()),
            description: format!("Rejected tax review request {request_id}"),
            metadata: json!({ "request_id": request_id }),
        })
        .await;

        Ok(request)
    }

    /// Saves a calculation an officer made on a citizen's behalf.
    pub async fn officer_calculation(
        &self,
        officer_id: &str,
        citizen_id: &str,
        result: &TaxResult,
    ) -> Result<TaxCalculation, ReviewError> {
        let mut record = NewTaxCalculation::from_result(citizen_id, result);
        record.officer_id = Some(officer_id.to_string());
        let calculation = self.repo.create_calculation(record).await?;

        self.audit(NewOfficerActivity {
            officer_id: officer_id.to_string(),
            activity_type: ActivityType::OfficerCalcCreate,
            target_user_id: Some(citizen_id.to_string()),
            description: format!("Created a tax calculation for citizen {citizen_id}"),
            metadata: json!({
                "total_income": result.total_income.to_string(),
                "total_expense": result.total_expense.to_string(),
                "calculated_tax": result.calculated_tax.to_string(),
            }),
        })
        .await;

        Ok(calculation)
    }

    /// Finds the citizen registered under `tin`.
    ///
    /// A hit is written to the audit log against the citizen; a miss returns
    /// `Ok(None)` and is not logged.
    ///
    /// # Errors
    ///
    /// * [`ReviewError::Profile`] if `tin` is not a well-formed TIN.
    pub async fn search_by_tin(
        &self,
        officer_id: &str,
        tin: &str,
    ) -> Result<Option<CitizenProfile>, ReviewError> {
        let tin = validate_tin(tin)?;
        let profile = match self.repo.find_profile_by_tin(&tin).await {
            Ok(profile) => profile,
            Err(RepositoryError::NotFound) => {
                info!(officer_id, tin = %tin, "no citizen registered for TIN");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        self.audit(NewOfficerActivity {
            officer_id: officer_id.to_string(),
            activity_type: ActivityType::TinSearch,
            target_user_id: Some(profile.id.clone()),
            description: format!("Searched citizen by TIN: {tin}"),
            metadata: json!({ "tin": tin }),
        })
        .await;

        Ok(Some(profile))
    }

    fn check_transition(
        request: &TaxRequest,
        to: TaxRequestStatus,
    ) -> Result<(), ReviewError> {
        if request.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(ReviewError::InvalidTransition {
                id: request.id,
                from: request.status,
                to,
            })
        }
    }

    fn transition_error(
        error: RepositoryError,
        to: TaxRequestStatus,
    ) -> ReviewError {
        match error {
            RepositoryError::StatusConflict { id, current } => ReviewError::InvalidTransition {
                id,
                from: current,
                to,
            },
            other => other.into(),
        }
    }

    async fn audit(
        &self,
        activity: NewOfficerActivity,
    ) {
        let activity_type = activity.activity_type;
        if let Err(e) = self.repo.log_activity(activity).await {
            warn!(
                activity_type = activity_type.as_str(),
                error = %e,
                "failed to write officer activity log"
            );
        }
    }
}
