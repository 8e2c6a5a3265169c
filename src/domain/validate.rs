use crate::domain::error::DomainError;

pub const MAX_POST_BODY_CHARS: usize = 500;
pub const MAX_USERNAME_CHARS: usize = 30;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// Entity validation runs before any persistence call and names the
/// offending field in the error message.
pub fn validate_post_body(body: &str) -> Result<(), DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::validation("body cannot be empty"));
    }
    if body.chars().count() > MAX_POST_BODY_CHARS {
        return Err(DomainError::validation(format!(
            "body exceeds {} characters",
            MAX_POST_BODY_CHARS
        )));
    }
    Ok(())
}

pub fn validate_new_account(
    username: &str,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<(), DomainError> {
    if username.trim().is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(DomainError::validation(format!(
            "username exceeds {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::validation(
            "username may only contain letters, digits, and underscores",
        ));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(DomainError::validation("email is not valid"));
    }
    if display_name.trim().is_empty() {
        return Err(DomainError::validation("display_name cannot be empty"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if password.len() > MAX_PASSWORD_CHARS {
        return Err(DomainError::validation(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_body_rejects_empty_and_whitespace() {
        assert!(validate_post_body("").is_err());
        assert!(validate_post_body("   \n").is_err());
        assert!(validate_post_body("hello").is_ok());
    }

    #[test]
    fn post_body_limit_counts_chars_not_bytes() {
        let at_limit: String = "ä".repeat(MAX_POST_BODY_CHARS);
        assert!(validate_post_body(&at_limit).is_ok());
        let over: String = "ä".repeat(MAX_POST_BODY_CHARS + 1);
        assert!(validate_post_body(&over).is_err());
    }

    #[test]
    fn username_charset() {
        assert!(validate_new_account("ok_name1", "a@b.c", "A", "longenough").is_ok());
        assert!(validate_new_account("bad name", "a@b.c", "A", "longenough").is_err());
        assert!(validate_new_account("bad-name", "a@b.c", "A", "longenough").is_err());
    }
}
