use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{AError, AResult};

pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Usernames are stored and looked up without surrounding whitespace.
pub fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String, // argon2 PHC string
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Registration body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFC {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserFC {
    pub fn validate(&self) -> AResult<()> {
        let username = normalize_username(&self.username);
        if username.is_empty() {
            return Err(AError::validation("username cannot be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AError::validation(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if !self.email.contains('@') {
            return Err(AError::validation("email is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginFC {
    pub username: String,
    pub password: String,
}

impl LoginFC {
    pub fn username(&self) -> &str {
        normalize_username(&self.username)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_fc(username: &str, email: &str, password: &str) -> UserFC {
        UserFC {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_user_fc_validate() {
        assert!(user_fc("alice", "alice@example.com", "password1")
            .validate()
            .is_ok());
        assert!(user_fc("  ", "alice@example.com", "password1")
            .validate()
            .is_err());
        assert!(user_fc("alice", "not-an-email", "password1")
            .validate()
            .is_err());
        assert!(user_fc("alice", "alice@example.com", "short")
            .validate()
            .is_err());
        assert!(user_fc(&"a".repeat(51), "alice@example.com", "password1")
            .validate()
            .is_err());
    }

    #[test]
    fn test_username_limit_counts_characters() {
        // 2 bytes per char in UTF-8
        assert!(user_fc(&"é".repeat(50), "e@example.com", "password1")
            .validate()
            .is_ok());
        assert!(user_fc(&"é".repeat(51), "e@example.com", "password1")
            .validate()
            .is_err());
        assert!(user_fc(&format!("  {}  ", "a".repeat(50)), "a@example.com", "password1")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_login_username_is_normalized() {
        let login = LoginFC {
            username: " alice ".to_string(),
            password: "password1".to_string(),
        };
        assert_eq!(login.username(), "alice");
    }

    #[test]
    fn test_public_view_drops_hash() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: "$argon2id$v=19$...".to_string(),
        };
        let json = serde_json::to_value(UserPublic::from(user)).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert_eq!(json["username"], "alice");
    }
}
