//! Author, committer and tagger identities
//!
//! A signature records who did something and when. The instant is stored as
//! seconds since the Unix epoch; the UTC offset is kept separately because it is
//! metadata about the author's clock, not part of the instant itself.
//!
//! ## Format
//!
//! `<name> <<email>> <epoch seconds> <+|-><hhmm>`

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::objects::object::MalformedObject;
use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use derive_new::new;

/// Largest offset the `<+|-><hhmm>` field can hold
const MAX_OFFSET_MINUTES: i32 = 99 * 60 + 59;

#[derive(Debug, Clone, Eq, PartialEq, Hash, new)]
pub struct Signature {
    name: String,
    email: String,
    /// Seconds since the Unix epoch
    time: i64,
    /// Offset from UTC in minutes
    offset_minutes: i32,
}

impl Signature {
    /// Signature stamped with the local clock
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = chrono::Local::now().fixed_offset();
        Self::from_datetime(name, email, now)
    }

    pub fn from_datetime(
        name: impl Into<String>,
        email: impl Into<String>,
        datetime: DateTime<FixedOffset>,
    ) -> Self {
        Signature {
            name: name.into(),
            email: email.into(),
            time: datetime.timestamp(),
            offset_minutes: datetime.offset().local_minus_utc() / 60,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    /// The instant in the signer's own time zone
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn when(&self) -> DateTime<FixedOffset> {
        let offset =
            FixedOffset::east_opt(self.offset_minutes * 60).unwrap_or_else(|| chrono::Utc.fix());

        offset
            .timestamp_opt(self.time, 0)
            .single()
            .unwrap_or_else(|| DateTime::<chrono::Utc>::UNIX_EPOCH.with_timezone(&offset))
    }

    /// Check that the encoding of this signature parses back to it
    ///
    /// Names and emails may not contain angle brackets or control characters,
    /// and may not start or end with whitespace. The offset must fit `hhmm`.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::invalid_argument("signature", self.display_name(), reason);

        for field in [&self.name, &self.email] {
            if field.chars().any(|c| c == '<' || c == '>' || c.is_control()) {
                return Err(invalid("angle brackets and control characters are not allowed"));
            }
            if field.trim() != field.as_str() {
                return Err(invalid("leading or trailing whitespace is not allowed"));
            }
        }
        if self.offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(invalid("time zone offset out of range"));
        }

        Ok(())
    }

    /// Format author name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Complete encoding including timestamp, as written into objects
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.time,
            format_offset(self.offset_minutes)
        )
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.when().format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }
}

fn format_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let minutes = offset_minutes.abs();
    format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
}

fn parse_offset(offset: &str) -> Option<i32> {
    let (sign, digits) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours = digits[..2].parse::<i32>().ok()?;
    let minutes = digits[2..].parse::<i32>().ok()?;
    Some(sign * (hours * 60 + minutes))
}

impl TryFrom<&str> for Signature {
    type Error = MalformedObject;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(MalformedObject::new(format!(
                "invalid signature format: {value}"
            )));
        }

        let offset_minutes = parse_offset(parts[0])
            .ok_or_else(|| MalformedObject::new(format!("invalid timezone: {}", parts[0])))?;
        let time = parts[1]
            .parse::<i64>()
            .map_err(|_| MalformedObject::new(format!("invalid timestamp: {}", parts[1])))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| MalformedObject::new("invalid signature format: missing '<'".into()))?;
        let email_end = name_email_part
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| MalformedObject::new("invalid signature format: missing '>'".into()))?;

        Ok(Signature {
            name: name_email_part[..email_start].trim().to_string(),
            email: name_email_part[email_start + 1..email_end].to_string(),
            time,
            offset_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::core::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::proptest;
    use rstest::rstest;

    proptest! {
        #[test]
        fn encoded_signatures_parse_back(
            name in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            email in "[a-z]{1,10}@[a-z]{1,10}\\.com",
            time in 0i64..4_000_000_000,
            offset_minutes in -720i32..=840,
        ) {
            let signature = Signature::new(name, email, time, offset_minutes);
            let parsed = Signature::try_from(signature.display().as_str()).unwrap();
            assert_eq!(parsed, signature);
        }
    }

    #[test]
    fn negative_offsets_are_formatted_with_sign() {
        let signature = Signature::new(
            "A U Thor".into(),
            "author@example.com".into(),
            1_700_000_000,
            -330,
        );

        assert_eq!(
            signature.display(),
            "A U Thor <author@example.com> 1700000000 -0530"
        );
    }

    #[test]
    fn offset_is_metadata_not_part_of_the_instant() {
        let utc = Signature::new("a".into(), "a@b.c".into(), 1_700_000_000, 0);
        let tokyo = Signature::new("a".into(), "a@b.c".into(), 1_700_000_000, 540);

        assert_eq!(utc.when(), tokyo.when());
        assert_ne!(utc.readable_timestamp(), tokyo.readable_timestamp());
    }

    #[test]
    fn valid_signatures_pass_validation() {
        let signature = Signature::new("A U Thor".into(), "author@example.com".into(), 0, -MAX_OFFSET_MINUTES);

        assert!(signature.validate().is_ok());
    }

    #[rstest]
    #[case("Ada\nLovelace", "ada@example.com", 0)]
    #[case("Ada <Lovelace>", "ada@example.com", 0)]
    #[case("Ada", "ada>@example.com", 0)]
    #[case(" Ada", "ada@example.com", 0)]
    #[case("Ada", "ada@example.com", 6000)]
    #[case("Ada", "ada@example.com", -6000)]
    fn signatures_that_would_not_parse_back_are_rejected(
        #[case] name: &str,
        #[case] email: &str,
        #[case] offset_minutes: i32,
    ) {
        let signature = Signature::new(name.into(), email.into(), 1_700_000_000, offset_minutes);

        let error = signature.validate().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn missing_email_brackets_are_rejected() {
        assert!(Signature::try_from("no email 1700000000 +0000").is_err());
    }
}
