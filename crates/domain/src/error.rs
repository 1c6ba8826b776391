//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`ZoneHubError`]
//! via `#[from]`. No bare `String` variants — every failure carries its typed
//! source.

use crate::id::VentId;

/// Top-level error type for the zonehub workspace.
#[derive(Debug, thiserror::Error)]
pub enum ZoneHubError {
    /// A domain invariant or configuration rule was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// An actuator command could not be dispatched to the host.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Persisted state could not be read or written.
    #[error("storage error")]
    Storage(#[from] StorageError),
}

/// Violations of domain invariants, reported at setup/options time.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A room, entry, or sensor identifier is empty.
    #[error("identifier must not be empty")]
    EmptyId,

    /// Two rooms in one entry share an identifier.
    #[error("duplicate room id: {0}")]
    DuplicateRoomId(String),

    /// The temperature deadband is negative.
    #[error("temperature deadband must not be negative")]
    NegativeDeadband,

    /// An unoccupied critical threshold is negative.
    #[error("critical temperature threshold must not be negative")]
    NegativeCriticalThreshold,

    /// The minimum-vents-open floor can never be satisfied by the
    /// configured vents.
    #[error("minimum vents open ({required}) cannot be met: {available} vents configured")]
    MinVentsUnsatisfiable { required: u32, available: u32 },

    /// A vent group declares zero members.
    #[error("vent group must have at least one member: {0}")]
    EmptyVentGroup(String),
}

/// A referenced object does not exist.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} not found: {id}")]
pub struct NotFoundError {
    /// Human-readable kind, e.g. `"Entry"` or `"Room"`.
    pub kind: &'static str,
    /// The identifier that failed to resolve.
    pub id: String,
}

/// An actuator command was rejected or could not be delivered.
///
/// The affected commanded state must be treated as unconfirmed and the
/// command retried on the next evaluation cycle.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{service} failed for {entity}: {reason}")]
pub struct CommandError {
    /// The host entity the command targeted.
    pub entity: String,
    /// The service that was invoked, e.g. `"set_hvac_mode"`.
    pub service: &'static str,
    /// Host-reported failure reason.
    pub reason: String,
}

/// Failures reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying file or transport failure.
    #[error("failed to access state store")]
    Io(#[from] std::io::Error),

    /// Stored payload could not be encoded or decoded.
    #[error("failed to decode persisted state")]
    Decode(#[from] serde_json::Error),
}

impl ZoneHubError {
    /// Convenience constructor for an unknown-vent condition.
    #[must_use]
    pub fn vent_not_found(vent: &VentId) -> Self {
        NotFoundError {
            kind: "Vent",
            id: vent.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error() {
        let err: ZoneHubError = ValidationError::NegativeDeadband.into();
        assert!(matches!(
            err,
            ZoneHubError::Validation(ValidationError::NegativeDeadband)
        ));
    }

    #[test]
    fn should_format_not_found_with_kind_and_id() {
        let err = NotFoundError {
            kind: "Entry",
            id: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "Entry not found: missing");
    }

    #[test]
    fn should_format_command_error_with_service_and_entity() {
        let err = CommandError {
            entity: "cover.vent_a".to_string(),
            service: "open_vent",
            reason: "unreachable".to_string(),
        };
        assert_eq!(err.to_string(), "open_vent failed for cover.vent_a: unreachable");
    }

    #[test]
    fn should_build_vent_not_found() {
        let err = ZoneHubError::vent_not_found(&VentId::from("cover.gone"));
        assert!(matches!(err, ZoneHubError::NotFound(_)));
    }
}
