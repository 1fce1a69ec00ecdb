use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::models::validate_identifier;
use super::registry::{AdmitResult, RoomRegistry};
use crate::auth::TokenGenerator;
use crate::shared::AppError;

/// Outcome of an attempt to enter a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Caller may enter using this token (freshly minted or re-presented)
    Admitted { token: String },
    /// Room already has its two participants
    Full,
    /// Room never existed, expired, or was destroyed
    RoomNotFound,
}

/// Decides whether a client may enter a room, and with which token
pub struct AdmissionGate {
    registry: Arc<RoomRegistry>,
    tokens: Arc<dyn TokenGenerator>,
}

impl AdmissionGate {
    pub fn new(registry: Arc<RoomRegistry>, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self { registry, tokens }
    }

    /// Runs the admission decision for `(room_id, existing_token?)`
    ///
    /// A member re-presenting its token is always let back in, even when the
    /// room is full. New joins go through the registry's atomic bounded append,
    /// so concurrent calls never admit more than two tokens.
    #[instrument(skip(self, existing_token))]
    pub async fn admit(
        &self,
        room_id: &str,
        existing_token: Option<&str>,
    ) -> Result<AdmissionDecision, AppError> {
        validate_identifier("room id", room_id)?;

        if self.registry.get_room(room_id).await?.is_none() {
            debug!(room_id = %room_id, "Rejecting admission, room not found");
            return Ok(AdmissionDecision::RoomNotFound);
        }

        // Malformed cookies are treated like no cookie at all
        let existing_token = existing_token.filter(|t| validate_identifier("token", t).is_ok());
        if let Some(token) = existing_token {
            if self.registry.is_token_connected(room_id, token).await? {
                debug!(room_id = %room_id, "Re-admitting existing member");
                return Ok(AdmissionDecision::Admitted {
                    token: token.to_string(),
                });
            }
        }

        let token = self.tokens.generate();
        let decision = match self.registry.admit_token(room_id, &token).await? {
            AdmitResult::Admitted => AdmissionDecision::Admitted { token },
            AdmitResult::AlreadyMember => {
                // The fresh token belongs to someone else; never hand it out twice
                warn!(room_id = %room_id, "Minted token collided with a member");
                return Err(AppError::Internal(
                    "minted token collided with a room member".to_string(),
                ));
            }
            AdmitResult::Full => AdmissionDecision::Full,
            AdmitResult::RoomNotFound => AdmissionDecision::RoomNotFound,
        };

        info!(room_id = %room_id, outcome = ?DecisionKind::from(&decision), "Admission decided");
        Ok(decision)
    }
}

/// Token-free view of a decision, for logging
#[derive(Debug)]
enum DecisionKind {
    Admitted,
    Full,
    RoomNotFound,
}

impl From<&AdmissionDecision> for DecisionKind {
    fn from(decision: &AdmissionDecision) -> Self {
        match decision {
            AdmissionDecision::Admitted { .. } => DecisionKind::Admitted,
            AdmissionDecision::Full => DecisionKind::Full,
            AdmissionDecision::RoomNotFound => DecisionKind::RoomNotFound,
        }
    }
}
