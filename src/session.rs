//! Principal and CSRF token for the host's signed-in user.
//!
//! The host authenticates; this side only remembers who is acting and
//! checks the token echoed back on every mutating request.

use crate::model::Principal;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub struct Session {
    principal: Principal,
    csrf_digest: [u8; 32],
    started_at: String,
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

impl Session {
    /// Starts a session and returns the CSRF token; only its digest is kept.
    pub fn begin(principal: Principal) -> (Self, String) {
        let token = Uuid::new_v4().simple().to_string();
        let session = Self {
            principal,
            csrf_digest: digest(&token),
            started_at: chrono::Utc::now().to_rfc3339(),
        };
        (session, token)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn started_at(&self) -> &str {
        &self.started_at
    }

    pub fn validate_csrf(&self, token: &str) -> bool {
        let presented = digest(token);
        // Fold over every byte so the comparison time does not depend on the mismatch position.
        presented
            .iter()
            .zip(self.csrf_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
