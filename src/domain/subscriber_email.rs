/// A normalized subscriber email address.
///
/// Normalization (trim + lowercase) happens before validation, so the inner
/// string is directly usable as a storage key: two spellings of the same
/// address always normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: &str) -> Result<Self, String> {
        let normalized = s.trim().to_lowercase();
        if is_valid_email(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(format!("'{}' is not a valid subscriber email", s))
        }
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Shape check: `local@domain`, no whitespace, no second `@`, and the domain
/// must contain a `.` with at least one character on each side.
fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    // A leading or trailing dot does not count: "a@b.c." is fine (inner dot
    // present) but "a@.com" is not.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for SubscriberEmail {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        SubscriberEmail::parse(&value)
    }
}
