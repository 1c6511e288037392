//! Form parsing and validation.
//!
//! Each form validates into either a cleaned value or [`FormErrors`]; the
//! handlers re-render the page with the errors and the submitted values.

use axum::extract::Multipart;
use serde::Deserialize;
use validator::ValidateEmail;

use crate::db::models::Group;
use crate::error::{AppError, AppResult};
use crate::media::Upload;

pub const REQUIRED: &str = "This field is required.";
/// Key for errors that belong to the whole form.
pub const NON_FIELD: &str = "__all__";

#[derive(Debug, Clone, Default)]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    /// First message for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn all(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

// --- Posts ---

/// Raw post form as submitted.
#[derive(Debug, Default)]
pub struct PostInput {
    pub text: String,
    pub group: String,
    pub image: Option<Upload>,
}

impl PostInput {
    /// Read the `text`, `group` and `image` fields of a multipart body.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut input = PostInput::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => {
                    input.text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid text field: {}", e)))?;
                }
                "group" => {
                    input.group = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid group field: {}", e)))?;
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid image field: {}", e)))?;
                    // Browsers send an empty part when no file was chosen
                    if !file_name.is_empty() || !bytes.is_empty() {
                        input.image = Some(Upload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(input)
    }
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(Upload, image::ImageFormat)>,
}

pub fn validate_post(input: PostInput, groups: &[Group]) -> Result<ValidPost, FormErrors> {
    let mut errors = FormErrors::default();

    let text = input.text.trim().to_string();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }

    let group_id = match input.group.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
            _ => {
                errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
                None
            }
        },
    };

    let image = match input.image {
        Some(upload) => match crate::media::validate_image(&upload.bytes) {
            Ok(format) => Some((upload, format)),
            Err(message) => {
                errors.add("image", message);
                None
            }
        },
        None => None,
    };

    if errors.is_empty() {
        Ok(ValidPost {
            text,
            group_id,
            image,
        })
    } else {
        Err(errors)
    }
}

// --- Comments ---

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn cleaned_text(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|t| !t.is_empty())
    }
}

// --- Accounts ---

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

pub const MAX_USERNAME_LENGTH: usize = 150;

pub fn username_problem(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        return Some(REQUIRED);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Some("Ensure this value has at most 150 characters.");
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Some(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    None
}

pub fn email_problem(email: &str) -> Option<&'static str> {
    if email.is_empty() || email.validate_email() {
        None
    } else {
        Some("Enter a valid email address.")
    }
}

/// Field checks that need no database. Uniqueness is checked by the handler.
pub fn validate_signup(form: &SignupForm) -> FormErrors {
    let mut errors = FormErrors::default();

    if let Some(problem) = username_problem(form.username.trim()) {
        errors.add("username", problem);
    }
    if let Some(problem) = email_problem(form.email.trim()) {
        errors.add("email", problem);
    }
    validate_new_password(&mut errors, &form.password1, &form.password2, form.username.trim());

    errors
}

fn validate_new_password(errors: &mut FormErrors, password1: &str, password2: &str, username: &str) {
    if password1.is_empty() {
        errors.add("password1", REQUIRED);
    }
    if password2.is_empty() {
        errors.add("password2", REQUIRED);
        return;
    }
    if password1 != password2 {
        errors.add("password2", "The two password fields didn't match.");
        return;
    }
    for problem in crate::auth::password::password_problems(password2, username) {
        errors.add("password2", problem);
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Checks on the new password pair. The old password is verified by the handler.
pub fn validate_password_change(form: &PasswordChangeForm, username: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    if form.old_password.is_empty() {
        errors.add("old_password", REQUIRED);
    }
    validate_new_password(&mut errors, &form.new_password1, &form.new_password2, username);
    errors
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next)
    } else {
        None
    }
}

// --- Admin ---

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GroupForm {
    pub title: String,
    pub slug: String,
    pub description: String,
}

pub fn slug_problem(slug: &str) -> Option<&'static str> {
    if slug.is_empty() {
        return Some(REQUIRED);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !slug.chars().all(allowed) {
        return Some(
            "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.",
        );
    }
    None
}

pub fn validate_group(form: &GroupForm) -> FormErrors {
    let mut errors = FormErrors::default();
    let title = form.title.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if title.chars().count() > 200 {
        errors.add("title", "Ensure this value has at most 200 characters.");
    }
    if let Some(problem) = slug_problem(form.slug.trim()) {
        errors.add("slug", problem);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: 7,
            title: "Cats".into(),
            slug: "cats".into(),
            description: String::new(),
        }]
    }

    #[test]
    fn post_requires_text() {
        let errors = validate_post(
            PostInput {
                text: "   ".into(),
                ..Default::default()
            },
            &groups(),
        )
        .unwrap_err();
        assert_eq!(errors.get("text"), Some(REQUIRED));
    }

    #[test]
    fn post_group_must_exist() {
        let errors = validate_post(
            PostInput {
                text: "hello".into(),
                group: "99".into(),
                image: None,
            },
            &groups(),
        )
        .unwrap_err();
        assert!(errors.has("group"));

        let ok = validate_post(
            PostInput {
                text: " hello ".into(),
                group: "7".into(),
                image: None,
            },
            &groups(),
        )
        .unwrap();
        assert_eq!(ok.text, "hello");
        assert_eq!(ok.group_id, Some(7));
    }

    #[test]
    fn post_image_must_be_an_image() {
        let errors = validate_post(
            PostInput {
                text: "hello".into(),
                group: String::new(),
                image: Some(Upload {
                    file_name: "notes.txt".into(),
                    bytes: b"plain text".to_vec(),
                }),
            },
            &groups(),
        )
        .unwrap_err();
        assert!(errors.has("image"));

        let ok = validate_post(
            PostInput {
                text: "hello".into(),
                group: String::new(),
                image: Some(Upload {
                    file_name: "small.gif".into(),
                    bytes: crate::media::SMALL_GIF.to_vec(),
                }),
            },
            &groups(),
        )
        .unwrap();
        assert_eq!(ok.image.map(|(_, f)| f), Some(image::ImageFormat::Gif));
    }

    #[test]
    fn comment_text_is_trimmed() {
        let form = CommentForm { text: "  hi ".into() };
        assert_eq!(form.cleaned_text(), Some("hi"));
        let blank = CommentForm { text: " ".into() };
        assert_eq!(blank.cleaned_text(), None);
    }

    #[test]
    fn signup_checks_every_field() {
        let form = SignupForm {
            username: "bad name!".into(),
            email: "nope".into(),
            password1: "abc".into(),
            password2: "abd".into(),
            ..Default::default()
        };
        let errors = validate_signup(&form);
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert_eq!(errors.get("password2"), Some("The two password fields didn't match."));
    }

    #[test]
    fn valid_signup_has_no_errors() {
        let form = SignupForm {
            username: "leo.tolstoy".into(),
            email: "leo@example.com".into(),
            password1: "war-and-peace".into(),
            password2: "war-and-peace".into(),
            ..Default::default()
        };
        assert!(validate_signup(&form).is_empty());
    }

    #[test]
    fn email_must_have_one_at_and_a_local_part() {
        for bad in ["a@b@c.com", "nope", "@example.com", "leo@"] {
            assert_eq!(email_problem(bad), Some("Enter a valid email address."), "{}", bad);
        }
        assert_eq!(email_problem("leo@example.com"), None);
        assert_eq!(email_problem(""), None);
    }

    #[test]
    fn weak_new_password_reports_all_problems() {
        let form = PasswordChangeForm {
            old_password: "old".into(),
            new_password1: "123".into(),
            new_password2: "123".into(),
        };
        assert_eq!(validate_password_change(&form, "leo").all("password2").len(), 2);
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next("/posts/1/edit/"), Some("/posts/1/edit/"));
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next(""), None);
    }

    #[test]
    fn group_slug_rules() {
        let errors = validate_group(&GroupForm {
            title: "Cats".into(),
            slug: "cats and dogs".into(),
            description: String::new(),
        });
        assert!(errors.has("slug"));
        assert!(validate_group(&GroupForm {
            title: "Cats".into(),
            slug: "cats_2".into(),
            description: String::new(),
        })
        .is_empty());
    }
}
