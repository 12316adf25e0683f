//! Account records and the forms that act on them.

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fitwear_core::{Email, Role, UserId};

use crate::error::ValidationError;

/// A FitWear account as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl User {
    /// "First Last", as printed on purchase notes and greetings.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Sign-in form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Serialize)]
pub(crate) struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

impl Credentials {
    /// Build credentials from form input.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Reject blank fields before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank username or password.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Username", &self.username)?;
        require("Password", self.password.expose_secret())
    }

    pub(crate) fn to_body(&self) -> CredentialsBody<'_> {
        CredentialsBody {
            username: self.username.trim(),
            password: self.password.expose_secret(),
        }
    }
}

/// Account registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct RegistrationBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
}

impl Registration {
    /// Check required fields and the email shape.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        require("Username", &self.username)?;
        require("Password", self.password.expose_secret())?;
        require("First name", &self.first_name)?;
        require("Last name", &self.last_name)?;
        Ok(Email::parse(&self.email)?)
    }

    pub(crate) fn to_body<'a>(&'a self, email: &'a Email) -> RegistrationBody<'a> {
        RegistrationBody {
            username: self.username.trim(),
            email: email.as_str(),
            password: self.password.expose_secret(),
            first_name: self.first_name.trim(),
            last_name: self.last_name.trim(),
            phone: non_blank(self.phone.as_deref()),
            address: non_blank(self.address.as_deref()),
        }
    }
}

/// Profile edit form. Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Whether the form changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }
}

/// Password change form.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

#[derive(Serialize)]
pub(crate) struct PasswordChangeBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl PasswordChange {
    /// Build the form from raw input.
    #[must_use]
    pub fn new(current_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            current_password: SecretString::from(current_password.into()),
            new_password: SecretString::from(new_password.into()),
        }
    }

    /// Both passwords must be present.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for a blank password.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Current password", self.current_password.expose_secret())?;
        require("New password", self.new_password.expose_secret())
    }

    pub(crate) fn to_body(&self) -> PasswordChangeBody<'_> {
        PasswordChangeBody {
            current_password: self.current_password.expose_secret(),
            new_password: self.new_password.expose_secret(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "ana".to_string(),
            email: "ana@fitwear.test".to_string(),
            password: SecretString::from("hunter22".to_string()),
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
            phone: Some("  ".to_string()),
            address: None,
        }
    }

    #[test]
    fn test_user_decodes_api_record() {
        let json = r#"{
            "id": 4, "username": "ana", "email": "ana@fitwear.test",
            "first_name": "Ana", "last_name": "Lima", "phone": null,
            "address": null, "role": "staff", "is_active": true,
            "created_at": "2024-03-01T10:15:30.123456",
            "updated_at": "2024-03-01T10:15:30.123456"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.full_name(), "Ana Lima");
    }

    #[test]
    fn test_credentials_reject_blank_fields() {
        let creds = Credentials::new("  ", "pw");
        assert_eq!(
            creds.validate(),
            Err(ValidationError::MissingField("Username"))
        );
        assert!(Credentials::new("ana", "pw").validate().is_ok());
    }

    #[test]
    fn test_registration_body_omits_blank_optionals() {
        let form = registration();
        let email = form.validate().unwrap();
        let body = serde_json::to_value(form.to_body(&email)).unwrap();
        assert_eq!(body["email"], "ana@fitwear.test");
        assert!(body.get("phone").is_none());
        assert!(body.get("address").is_none());
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        let mut form = registration();
        form.email = "ana.fitwear.test".to_string();
        assert!(matches!(
            form.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            phone: Some("555-0100".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"phone": "555-0100"}));
        assert!(ProfileUpdate::default().is_empty());
    }
}
