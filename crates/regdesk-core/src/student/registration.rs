//! Registration input and validation.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::access::Department;
use crate::error::{CoreError, CoreResult};

/// Minimum number of digits a phone number must contain.
pub const MIN_PHONE_DIGITS: usize = 10;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));

/// Registration fields as submitted. Absent fields deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewStudent {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub dob: String,
}

/// A registration that passed [`NewStudent::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub department: Department,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub dob: NaiveDate,
}

impl NewStudent {
    /// Checks presence and format of every field.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] naming the first offending field.
    pub fn validate(self) -> CoreResult<Registration> {
        let fields = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("department", &self.department),
            ("parent_name", &self.parent_name),
            ("parent_email", &self.parent_email),
            ("parent_phone", &self.parent_phone),
            ("dob", &self.dob),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CoreError::validation(format!("{field} is required")));
        }

        let email = self.email.trim().to_owned();
        let parent_email = self.parent_email.trim().to_owned();
        check_email("email", &email)?;
        check_email("parent_email", &parent_email)?;
        check_phone("phone", &self.phone)?;
        check_phone("parent_phone", &self.parent_phone)?;

        let department = self.department.parse::<Department>()?;
        let dob = NaiveDate::parse_from_str(self.dob.trim(), "%Y-%m-%d")
            .map_err(|_| CoreError::validation("dob must be a date in YYYY-MM-DD format"))?;
        if dob > Utc::now().date_naive() {
            return Err(CoreError::validation("dob cannot be in the future"));
        }

        Ok(Registration {
            name: self.name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            email,
            department,
            parent_name: self.parent_name.trim().to_owned(),
            parent_email,
            parent_phone: self.parent_phone.trim().to_owned(),
            dob,
        })
    }
}

fn check_email(field: &str, value: &str) -> CoreResult<()> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::validation(format!("{field} is not a valid email address")))
    }
}

fn check_phone(field: &str, value: &str) -> CoreResult<()> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if digits >= MIN_PHONE_DIGITS {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "{field} must contain at least {MIN_PHONE_DIGITS} digits"
        )))
    }
}

#[cfg(test)]
pub(crate) fn sample(email: &str) -> NewStudent {
    NewStudent {
        name: "Asha Rao".to_string(),
        phone: "98765 43210".to_string(),
        email: email.to_string(),
        department: "Computer Science".to_string(),
        parent_name: "Ravi Rao".to_string(),
        parent_email: "ravi@example.com".to_string(),
        parent_phone: "+91 9876500000".to_string(),
        dob: "2006-04-12".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: CoreError) -> String {
        match err {
            CoreError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_is_trimmed() {
        let reg = sample("  asha@example.com ").validate().unwrap();
        assert_eq!(reg.email, "asha@example.com");
        assert_eq!(reg.phone, "98765 43210");
        assert_eq!(reg.department, Department::ComputerScience);
        assert_eq!(reg.dob, NaiveDate::from_ymd_opt(2006, 4, 12).unwrap());
    }

    #[test]
    fn missing_field_is_named() {
        let mut input = sample("asha@example.com");
        input.parent_phone = "   ".to_string();
        assert_eq!(message(input.validate().unwrap_err()), "parent_phone is required");
    }

    #[test]
    fn absent_fields_deserialize_empty() {
        let input: NewStudent = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert_eq!(message(input.validate().unwrap_err()), "phone is required");
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = sample("not-an-email").validate().unwrap_err();
        assert_eq!(message(err), "email is not a valid email address");
    }

    #[test]
    fn short_phone_is_rejected() {
        let mut input = sample("asha@example.com");
        input.phone = "12345".to_string();
        assert!(message(input.validate().unwrap_err()).starts_with("phone must contain"));
    }

    #[test]
    fn unknown_department_is_rejected() {
        let mut input = sample("asha@example.com");
        input.department = "Astrology".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn bad_or_future_dob_is_rejected() {
        let mut input = sample("asha@example.com");
        input.dob = "12/04/2006".to_string();
        assert!(input.clone().validate().is_err());
        input.dob = "2999-01-01".to_string();
        assert_eq!(message(input.validate().unwrap_err()), "dob cannot be in the future");
    }
}
