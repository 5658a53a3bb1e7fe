//! Claims domain errors
//!
//! The taxonomy mirrors the operation contracts: `NotFound`, `Validation`
//! (with the precise missing-requirement list where applicable),
//! `Unauthorized`, and `InvalidTransition` for status conflicts. Collaborator
//! failures on the primary path surface as `Port`.

use thiserror::Error;

use core_kernel::PortError;

use crate::readiness::MissingRequirement;
use crate::status::ClaimStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Claim is not ready for submission: {0:?}")]
    NotReadyForSubmission(Vec<MissingRequirement>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: ClaimStatus, to: ClaimStatus },

    #[error("Operation requires one of {required:?}, claim is {current} and cannot auto-progress")]
    StatusConflict {
        current: ClaimStatus,
        required: Vec<ClaimStatus>,
    },

    #[error("Repair type is locked to service-center repair and cannot become EVM repair")]
    RepairTypeLocked,

    #[error("Collaborator error: {0}")]
    Port(#[from] PortError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ClaimError::Unauthorized(message.into())
    }
}
