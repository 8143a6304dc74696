//! Permission seam.
//!
//! The engine asks the [`Authorizer`] before every state-changing
//! operation. The check is identity-based: who is acting, what they want
//! to do, and for which company. [`AllowAll`] is the default wiring;
//! production deployments substitute a role-backed implementation.

/// Permission names checked by the engine, one per operation.
pub mod permissions {
    /// Create a payroll run.
    pub const RUN_CREATE: &str = "payroll.run.create";
    /// Validate a run's data completeness.
    pub const RUN_VALIDATE: &str = "payroll.run.validate";
    /// Calculate (or recalculate) a run.
    pub const RUN_CALCULATE: &str = "payroll.run.calculate";
    /// Mark a run's review complete.
    pub const RUN_REVIEW: &str = "payroll.run.review";
    /// Release payslips for payment.
    pub const RUN_GENERATE: &str = "payroll.run.generate";
    /// Close a run as paid.
    pub const RUN_CLOSE: &str = "payroll.run.close";
    /// Reopen a released or paid run.
    pub const RUN_REOPEN: &str = "payroll.run.reopen";
    /// Record a manual adjustment against a run.
    pub const RUN_ADJUST: &str = "payroll.run.adjust";
}

/// Decides whether an actor may perform an operation.
pub trait Authorizer: Send + Sync {
    /// Returns true if `actor_id` holds `permission` for `company_id`.
    fn can(&self, actor_id: &str, permission: &str, company_id: &str) -> bool;
}

/// Grants every permission to every actor.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can(&self, _actor_id: &str, _permission: &str, _company_id: &str) -> bool {
        true
    }
}

/// Denies every permission. Used in tests to exercise the refusal path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl Authorizer for DenyAll {
    fn can(&self, _actor_id: &str, _permission: &str, _company_id: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all_grants_everything() {
        let auth = AllowAll;
        assert!(auth.can("system", permissions::RUN_CREATE, "PH-ACME"));
        assert!(auth.can("anyone", permissions::RUN_CLOSE, "OTHER"));
    }

    #[test]
    fn test_deny_all_refuses_everything() {
        let auth = DenyAll;
        assert!(!auth.can("system", permissions::RUN_CREATE, "PH-ACME"));
        assert!(!auth.can("admin", permissions::RUN_REOPEN, "PH-ACME"));
    }
}
