use std::collections::HashSet;

/// Gate consulted before an analysis may run.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, email: &str) -> bool;
}

/// Case-insensitive set of allowed email addresses.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parse a comma separated list such as `a@x.com, b@y.com`.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }
}

/// Lets everyone through. Used when no allow-list is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl Authorizer for OpenGate {
    fn is_authorized(&self, _email: &str) -> bool {
        true
    }
}
