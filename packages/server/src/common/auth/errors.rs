use std::fmt;
use thiserror::Error;

/// Why a scope evaluation denied. The string codes are part of the API
/// contract: storefront clients pattern-match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No session scope was available to evaluate against
    OrganizationDataNotFound,
    /// Scope and role were evaluated and rejected
    OperationNotPermitted,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::OrganizationDataNotFound => "organization-data-not-found",
            DenialReason::OperationNotPermitted => "operation-not-permitted",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Authorization errors raised by the guard chain
///
/// Only the final guard decision raises; every external lookup on the way
/// folds its failures into a negative boolean instead.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No candidate credential of the required class was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// Credentials were presented but none validated with the required role
    #[error("Forbidden")]
    Forbidden,

    /// Scope/role evaluation denied with a client-visible reason code
    #[error("{0}")]
    Denied(DenialReason),
}

impl AuthError {
    /// HTTP-equivalent status for metric/audit classification
    pub fn status(&self) -> u16 {
        match self {
            AuthError::Unauthenticated => 401,
            AuthError::Forbidden | AuthError::Denied(_) => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_reason_codes_are_stable() {
        assert_eq!(
            DenialReason::OrganizationDataNotFound.to_string(),
            "organization-data-not-found"
        );
        assert_eq!(
            DenialReason::OperationNotPermitted.to_string(),
            "operation-not-permitted"
        );
    }

    #[test]
    fn error_messages_match_contract() {
        assert_eq!(AuthError::Unauthenticated.to_string(), "Authentication required");
        assert_eq!(AuthError::Forbidden.to_string(), "Forbidden");
        assert_eq!(
            AuthError::Denied(DenialReason::OperationNotPermitted).to_string(),
            "operation-not-permitted"
        );
    }

    #[test]
    fn statuses_classify_unauthenticated_vs_forbidden() {
        assert_eq!(AuthError::Unauthenticated.status(), 401);
        assert_eq!(AuthError::Forbidden.status(), 403);
        assert_eq!(
            AuthError::Denied(DenialReason::OrganizationDataNotFound).status(),
            403
        );
    }
}
