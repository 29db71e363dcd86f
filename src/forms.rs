//! Form payloads and their validation. Failures stay local: handlers
//! re-render the form with the messages collected here, they never turn
//! into hard errors.

use serde::Deserialize;

use crate::content::questions::QuestionPatch;
use crate::content::reviews::ReviewPatch;
use crate::users::ProfilePatch;

#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        } else if self.username.trim().len() > 20 {
            errors.push(FieldError::new(
                "username",
                "Username cannot be more than 20 characters",
            ));
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Must be valid email address"));
        } else if self.email.trim().len() > 30 {
            errors.push(FieldError::new("email", "Email address is too long"));
        }
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "First name is required"));
        } else if self.first_name.trim().len() > 20 {
            errors.push(FieldError::new("first_name", "First name is too long"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("last_name", "Last name is required"));
        } else if self.last_name.trim().len() > 20 {
            errors.push(FieldError::new("last_name", "Last name is too long"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password != self.confirm {
            errors.push(FieldError::new("password", "Passwords must match"));
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileEditForm {
    pub email: String,
    pub bio: String,
    pub image_url: String,
    pub password: String,
    pub new_password: String,
    pub confirm: String,
}

impl ProfileEditForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if let Some(email) = none_if_empty(&self.email) {
            if !looks_like_email(&email) {
                errors.push(FieldError::new("email", "Must be valid email address"));
            }
        }
        if !self.new_password.is_empty() && self.new_password != self.confirm {
            errors.push(FieldError::new("new_password", "Passwords must match"));
        }
        errors
    }

    /// Empty fields mean "leave unchanged".
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            email: none_if_empty(&self.email),
            bio: none_if_empty(&self.bio),
            image_url: none_if_empty(&self.image_url),
            new_password: none_if_empty(&self.new_password),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAccountForm {
    pub password: String,
}

impl DeleteAccountForm {
    pub fn validate(&self) -> Vec<FieldError> {
        if self.password.is_empty() {
            vec![FieldError::new("password", "Password is required")]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub title: String,
    pub rating: String,
    pub text: String,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<(String, f64, String), Vec<FieldError>> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        if title.len() < 3 || title.len() > 50 {
            errors.push(FieldError::new(
                "title",
                "Title must be between 3 and 50 characters in length",
            ));
        }
        let rating = match self.rating.trim().parse::<f64>() {
            Ok(r) if (0.0..=10.0).contains(&r) => Some(r),
            _ => {
                errors.push(FieldError::new(
                    "rating",
                    "Rating must be a number between 0 and 10",
                ));
                None
            }
        };
        let text = self.text.trim();
        if text.len() < 3 {
            errors.push(FieldError::new(
                "text",
                "Review must be at least one word long",
            ));
        }
        match (errors.is_empty(), rating) {
            (true, Some(rating)) => Ok((title.to_string(), rating, text.to_string())),
            _ => Err(errors),
        }
    }

    pub fn to_patch(&self) -> Result<ReviewPatch, Vec<FieldError>> {
        let (title, rating, text) = self.validate()?;
        Ok(ReviewPatch {
            title: Some(title),
            rating: Some(rating),
            text: Some(text),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestionForm {
    pub title: String,
    pub text: String,
}

impl QuestionForm {
    pub fn validate(&self) -> Result<(String, String), Vec<FieldError>> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        if title.len() < 3 || title.len() > 50 {
            errors.push(FieldError::new(
                "title",
                "Title must be between 3 and 50 characters in length",
            ));
        }
        let text = self.text.trim();
        if text.len() < 3 {
            errors.push(FieldError::new(
                "text",
                "Question must be at least one word long",
            ));
        }
        if errors.is_empty() {
            Ok((title.to_string(), text.to_string()))
        } else {
            Err(errors)
        }
    }

    pub fn to_patch(&self) -> Result<QuestionPatch, Vec<FieldError>> {
        let (title, text) = self.validate()?;
        Ok(QuestionPatch {
            title: Some(title),
            text: Some(text),
        })
    }
}
