use time::OffsetDateTime;

use crate::auth::repo_types::User;

/// Outcome of checking a presented session token against a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid,
    Expired,
    Mismatched,
}

/// Exact match first, then expiry. An exact match at or past
/// `session_expiration` is `Expired`; nothing here extends a session.
pub fn validate(presented: &str, user: &User, now: OffsetDateTime) -> SessionStatus {
    if presented != user.session_token {
        return SessionStatus::Mismatched;
    }
    if now >= user.session_expiration {
        return SessionStatus::Expired;
    }
    SessionStatus::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn user_with(token: &str, expires: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            username: Some("alice".into()),
            password_hash: "$argon2id$stub".into(),
            session_token: token.into(),
            session_expiration: expires,
            update_token: "u".repeat(64),
            created_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn exact_token_before_expiry_is_valid() {
        let user = user_with("abc", datetime!(2024-01-01 1:00 UTC));
        let status = validate("abc", &user, datetime!(2024-01-01 0:59 UTC));
        assert_eq!(status, SessionStatus::Valid);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let expires = datetime!(2024-01-01 1:00 UTC);
        let user = user_with("abc", expires);
        assert_eq!(validate("abc", &user, expires), SessionStatus::Expired);
        assert_eq!(
            validate("abc", &user, datetime!(2024-01-02 0:00 UTC)),
            SessionStatus::Expired
        );
    }

    #[test]
    fn prefix_or_padded_tokens_are_mismatched() {
        let user = user_with("abcdef", datetime!(2024-01-01 1:00 UTC));
        let now = datetime!(2024-01-01 0:00 UTC);
        assert_eq!(validate("abc", &user, now), SessionStatus::Mismatched);
        assert_eq!(validate("abcdef ", &user, now), SessionStatus::Mismatched);
        assert_eq!(validate("ABCDEF", &user, now), SessionStatus::Mismatched);
    }

    #[test]
    fn mismatch_wins_over_expiry() {
        let user = user_with("abc", datetime!(2024-01-01 1:00 UTC));
        let status = validate("xyz", &user, datetime!(2024-06-01 0:00 UTC));
        assert_eq!(status, SessionStatus::Mismatched);
    }
}
