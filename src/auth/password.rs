use crate::error::AppResult;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(plaintext: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

/// Constant-time check via bcrypt. Users without a password never match.
pub fn verify_password(plaintext: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => bcrypt::verify(plaintext, hash).unwrap_or(false),
        None => false,
    }
}

/// Strength rules for a new password; returns every violated rule.
pub fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        problems.push("The password is too similar to the username.".to_string());
    }
    problems
}
