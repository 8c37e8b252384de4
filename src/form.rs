//! Form data for create/edit flows and their validation.
//!
//! Validation never touches the database; handlers supply whatever lookups a
//! form needs (e.g. the list of groups) and re-render the form with the
//! returned [`FormErrors`] when it is not empty.

use crate::media::{read_file_field, UploadPayload};
use crate::orm::groups;
use actix_multipart::Multipart;
use actix_web::{error, Error};
use futures_util::{StreamExt, TryStreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Upper bound on a single text field of a multipart form.
const MAX_TEXT_FIELD: usize = 64 * 1024;
const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern"));

/// Per-field error messages, in the order they were found.
#[derive(Debug, Default)]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|(f, _)| *f == field)
    }

    /// Messages for one field.
    pub fn get(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

fn require_text(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
}

/// Post create/edit form, submitted as multipart/form-data.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    /// Raw value of the group select; empty means no group.
    pub group: String,
    pub image: Option<UploadPayload>,
}

impl PostForm {
    /// Prefills the form from an existing post.
    pub fn from_post(text: &str, group_id: Option<i32>) -> Self {
        Self {
            text: text.to_owned(),
            group: group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
        }
    }

    /// Reads the `text`, `group` and `image` parts. Unknown parts are rejected.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, Error> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.try_next().await.map_err(|e| {
            log::warn!("PostForm::from_multipart: {}", e);
            error::ErrorBadRequest("Malformed form submission.")
        })? {
            let name = field
                .content_disposition()
                .get_name()
                .unwrap_or_default()
                .to_owned();

            match name.as_str() {
                "text" => form.text = read_text_field(&mut field).await?,
                "group" => form.group = read_text_field(&mut field).await?,
                "image" => form.image = read_file_field(&mut field).await?,
                _ => {
                    return Err(error::ErrorBadRequest(format!(
                        "Unknown field '{}'",
                        name
                    )))
                }
            }
        }

        Ok(form)
    }

    /// Parsed group id; None for an empty or malformed value.
    pub fn group_id(&self) -> Option<i32> {
        self.group.trim().parse::<i32>().ok()
    }

    pub fn is_selected(&self, group_id: i32) -> bool {
        self.group_id() == Some(group_id)
    }

    pub fn validate(&self, groups: &[groups::Model]) -> FormErrors {
        let mut errors = FormErrors::default();

        require_text(&mut errors, "text", &self.text);

        let group = self.group.trim();
        if !group.is_empty() {
            match self.group_id() {
                Some(id) if groups.iter().any(|g| g.id == id) => {}
                _ => errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                ),
            }
        }

        if let Some(image) = &self.image {
            if image.image_extension().is_none() {
                errors.add(
                    "image",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
        }

        errors
    }
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::warn!("read_text_field: {}", e);
            error::ErrorBadRequest("Error reading form data.")
        })?;
        if buf.len() + bytes.len() > MAX_TEXT_FIELD {
            return Err(error::ErrorPayloadTooLarge("Form field is too large."));
        }
        buf.extend_from_slice(&bytes);
    }
    String::from_utf8(buf).map_err(|_| error::ErrorBadRequest("Form data is not UTF-8."))
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        require_text(&mut errors, "text", &self.text);
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Checks everything except username uniqueness, which needs the database.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!(
                    "Ensure this value has at most {} characters.",
                    USERNAME_MAX_LEN
                ),
            );
        } else if !USERNAME_RE.is_match(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN_LEN
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors
    }

    pub fn email(&self) -> Option<&str> {
        Some(self.email.trim()).filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Accepts only local absolute paths as post-login destinations.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
