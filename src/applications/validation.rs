//! Submission validation.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::applications::{Application, ApplicationError, ApplicationStatus, ApplicationSubmission};

const MAX_COVER_NOTE: usize = 500;
const MAX_EXPERIENCE_YEARS: u32 = 50;

/// Validate a submission and turn it into a pending application.
pub fn validate_submission(submission: ApplicationSubmission) -> Result<Application, ApplicationError> {
    let full_name = required(submission.full_name, "full_name")?;
    let email = required(submission.email, "email")?.to_lowercase();
    let contact_number = required(submission.contact_number, "contact_number")?;

    if !is_valid_email(&email) {
        return Err(invalid("Invalid email format"));
    }

    let digits: String = contact_number.chars().filter(char::is_ascii_digit).collect();
    if !(10..=15).contains(&digits.len()) {
        return Err(invalid(
            "Invalid phone number format. Please provide a valid phone number with 10-15 digits.",
        ));
    }

    if full_name.chars().count() < 2 {
        return Err(invalid("Full name must be at least 2 characters long"));
    }

    for (years, label) in [
        (submission.total_experience, "Total Experience"),
        (submission.ts_experience, "Ts Experience"),
        (submission.react_experience, "React Experience"),
    ] {
        if years.is_some_and(|y| y > MAX_EXPERIENCE_YEARS) {
            return Err(invalid(&format!("{label} must be between 0 and 50 years")));
        }
    }

    let portfolio_url = optional_url(
        submission.portfolio_url,
        is_valid_url,
        "Invalid portfolio URL format. Please provide a valid URL starting with http:// or https://",
    )?;
    let github_url = optional_url(
        submission.github_url,
        |u| is_profile_url(u, &["github.com", "www.github.com"], &[]),
        "Invalid GitHub URL format. Please provide a valid GitHub profile URL",
    )?;
    let linkedin_url = optional_url(
        submission.linkedin_url,
        |u| is_profile_url(u, &["linkedin.com", "www.linkedin.com"], &["in"]),
        "Invalid LinkedIn URL format. Please provide a valid LinkedIn profile URL",
    )?;

    let cover_note = submission.cover_note.filter(|n| !n.is_empty());
    if cover_note.as_ref().is_some_and(|n| n.chars().count() > MAX_COVER_NOTE) {
        return Err(invalid("Cover note must be less than 500 characters"));
    }

    Ok(Application {
        application_id: Uuid::new_v4(),
        full_name,
        email,
        contact_number: format!("+{digits}"),
        total_experience: submission.total_experience,
        ts_experience: submission.ts_experience,
        react_experience: submission.react_experience,
        portfolio_url,
        github_url,
        linkedin_url,
        cover_note,
        status: ApplicationStatus::Pending,
        created_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, ApplicationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| invalid(&format!("Missing or empty required field: {field}")))
}

/// Blank means not provided; anything else must pass `check`.
fn optional_url(
    value: Option<String>,
    check: impl Fn(&str) -> bool,
    message: &str,
) -> Result<Option<String>, ApplicationError> {
    match value.filter(|u| !u.trim().is_empty()) {
        Some(url) if !check(&url) => Err(invalid(message)),
        other => Ok(other),
    }
}

fn invalid(message: &str) -> ApplicationError {
    ApplicationError::Invalid(message.to_string())
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty()
        && !host.is_empty()
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

fn is_valid_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// `http(s)://<host>/<prefix..>/<handle>[/]` where the handle is `[A-Za-z0-9_-]+`.
fn is_profile_url(raw: &str, hosts: &[&str], prefix: &[&str]) -> bool {
    let Ok(url) = url::Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https")
        || url.query().is_some()
        || url.fragment().is_some()
        || url.port().is_some()
        || !url.username().is_empty()
    {
        return false;
    }
    if !url.host_str().is_some_and(|h| hosts.contains(&h)) {
        return false;
    }

    let path = url.path().strip_prefix('/').unwrap_or_default();
    let path = path.strip_suffix('/').unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();
    let Some((handle, leading)) = segments.split_last() else {
        return false;
    };

    leading.len() == prefix.len()
        && leading.iter().zip(prefix).all(|(a, b)| a.eq_ignore_ascii_case(b))
        && !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
