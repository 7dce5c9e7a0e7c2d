//! User field rules

use greenlight_common::validation::matches_email;
use greenlight_common::Validator;

use super::entities::User;

pub const MAX_NAME_BYTES: usize = 500;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "a user with this email address already exists";

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches_email(email), "email", "must be a valid email address");
}

fn validate_optional_name(v: &mut Validator, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        v.check(
            value.len() <= MAX_NAME_BYTES,
            key,
            "must not be more than 500 bytes long",
        );
    }
}

/// Record every rule the profile fields of an account break
pub fn validate_profile(
    v: &mut Validator,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
    email: &str,
) {
    v.check(!first_name.is_empty(), "first_name", "must be provided");
    v.check(
        first_name.len() <= MAX_NAME_BYTES,
        "first_name",
        "must not be more than 500 bytes long",
    );
    validate_optional_name(v, "last_name", last_name);
    validate_optional_name(v, "username", username);
    validate_email(v, email);
}

pub fn validate_user(v: &mut Validator, user: &User) {
    validate_profile(
        v,
        &user.first_name,
        user.last_name.as_deref(),
        user.username.as_deref(),
        &user.email,
    );
}
