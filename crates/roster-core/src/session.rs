//! Sessions and identity.
//!
//! A [`Session`] is created at login and passed explicitly to every operation
//! that needs to know who is acting. Nothing about the current user lives in
//! global state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a session is allowed to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
  /// Registers citizens and reads everything.
  Admin,
  /// Registers citizens under their own name.
  Operator,
  /// Arrived through an operator's referral link; registrations are credited
  /// to the referrer.
  Guest { referrer: String },
}

/// An operator known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub username: String,
  pub admin:    bool,
}

/// Source of truth for operator credentials.
pub trait IdentityProvider: Send + Sync {
  /// Check a username/password pair. `None` on any mismatch.
  fn verify(&self, username: &str, password: &str) -> Option<Identity>;

  /// Look up an operator without credentials (used to validate referrals).
  fn lookup(&self, username: &str) -> Option<Identity>;
}

/// An authenticated interaction context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_id: Uuid,
  /// Username for operators and admins; the referrer for guests.
  pub operator:   String,
  pub role:       Role,
  pub started_at: DateTime<Utc>,
}

impl Session {
  /// Open a session for a verified identity.
  pub fn login(identity: &Identity) -> Self {
    Self {
      session_id: Uuid::new_v4(),
      operator:   identity.username.clone(),
      role:       if identity.admin { Role::Admin } else { Role::Operator },
      started_at: Utc::now(),
    }
  }

  /// Open a guest session registering on behalf of `referrer`.
  pub fn guest(referrer: &Identity) -> Self {
    Self {
      session_id: Uuid::new_v4(),
      operator:   referrer.username.clone(),
      role:       Role::Guest { referrer: referrer.username.clone() },
      started_at: Utc::now(),
    }
  }

  /// The operator id written into `SubmittedBy`.
  pub fn submitter(&self) -> &str {
    match &self.role {
      Role::Guest { referrer } => referrer,
      Role::Admin | Role::Operator => &self.operator,
    }
  }

  pub fn can_register(&self) -> bool { true }

  /// Search, statistics and listings are admin-only.
  pub fn can_read(&self) -> bool { matches!(self.role, Role::Admin) }

  pub fn is_guest(&self) -> bool { matches!(self.role, Role::Guest { .. }) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn identity(name: &str, admin: bool) -> Identity {
    Identity { username: name.into(), admin }
  }

  #[test]
  fn guest_submits_under_referrer() {
    let s = Session::guest(&identity("arturo", false));
    assert!(s.is_guest());
    assert_eq!(s.submitter(), "arturo");
    assert!(s.can_register());
    assert!(!s.can_read());
  }

  #[test]
  fn only_admins_read() {
    assert!(Session::login(&identity("fabian", true)).can_read());
    assert!(!Session::login(&identity("arturo", false)).can_read());
  }

  #[test]
  fn sessions_are_distinct() {
    let id = identity("xammy", true);
    assert_ne!(Session::login(&id).session_id, Session::login(&id).session_id);
  }
}
