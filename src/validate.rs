use crate::error::{Field, FieldError};
use crate::model::{StudentDraft, StudentInput};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ROLL_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9 +()-]+$").unwrap();
}

const MIN_USERNAME_LEN: usize = 3;

fn non_blank(raw: &str, field: Field) -> Result<&str, FieldError> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(FieldError::EmptyField(field));
    }
    Ok(t)
}

/// Uppercases the first letter of every run of letters and lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }
    out
}

pub fn validate_name(raw: &str) -> Result<String, FieldError> {
    non_blank(raw, Field::Name).map(title_case)
}

pub fn validate_roll(raw: &str) -> Result<String, FieldError> {
    let t = non_blank(raw, Field::Roll)?;
    if !ROLL_RE.is_match(t) {
        return Err(FieldError::InvalidFormat {
            field: Field::Roll,
            reason: "only letters, digits, hyphens and underscores are allowed",
        });
    }
    Ok(t.to_ascii_uppercase())
}

pub fn validate_department(raw: &str) -> Result<String, FieldError> {
    non_blank(raw, Field::Department).map(title_case)
}

pub fn validate_email(raw: &str) -> Result<String, FieldError> {
    let t = non_blank(raw, Field::Email)?.to_lowercase();
    if !EMAIL_RE.is_match(&t) {
        return Err(FieldError::InvalidFormat {
            field: Field::Email,
            reason: "expected local@domain.tld",
        });
    }
    Ok(t)
}

/// Blank input means "no phone" and is not an error.
pub fn validate_phone(raw: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(t) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if !PHONE_RE.is_match(t) || !t.chars().any(|c| c.is_ascii_digit()) {
        return Err(FieldError::InvalidFormat {
            field: Field::Phone,
            reason: "only digits, spaces, '+', '-' and parentheses are allowed",
        });
    }
    Ok(Some(t.to_string()))
}

pub fn validate_username(raw: &str) -> Result<String, FieldError> {
    let t = non_blank(raw, Field::Username)?;
    if t.chars().count() < MIN_USERNAME_LEN {
        return Err(FieldError::InvalidFormat {
            field: Field::Username,
            reason: "must be at least 3 characters long",
        });
    }
    Ok(t.to_string())
}

/// Validates every field and reports all failures, in field order.
pub fn validate_student(input: &StudentInput) -> Result<StudentDraft, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut check = |r: Result<String, FieldError>| match r {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    let name = check(validate_name(&input.name));
    let roll = check(validate_roll(&input.roll));
    let department = check(validate_department(&input.department));
    let email = check(validate_email(&input.email));
    let phone = match validate_phone(input.phone.as_deref()) {
        Ok(v) => v,
        Err(e) => {
            errors.push(e);
            None
        }
    };

    match (name, roll, department, email) {
        (Some(name), Some(roll), Some(department), Some(email)) if errors.is_empty() => {
            Ok(StudentDraft {
                name,
                roll,
                department,
                email,
                phone,
            })
        }
        _ => Err(errors),
    }
}
