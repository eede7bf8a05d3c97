//! Key namespacing.
//!
//! Every logical key is mapped onto two backend keys:
//!
//! ```text
//! stored key      = prefix + bucket + key
//! expiration key  = prefix + bucket + key + suffix
//! ```
//!
//! `prefix + bucket` is the namespace scope. Membership is a literal
//! string-prefix test, so a scope `"A"` also matches keys written under a
//! scope `"AB"`. Engines sharing a backend must use scopes where neither is
//! a prefix of the other.

/// Default suffix appended to form expiration keys.
pub const DEFAULT_SUFFIX: &str = "-expiration";

/// Key-generation policy for one expiring cache.
///
/// # Example
///
/// ```
/// use kvexpiry::expiry::Namespace;
///
/// let ns = Namespace::new("app:").with_bucket("sessions:");
/// assert_eq!(ns.stored_key("abc"), "app:sessions:abc");
/// assert_eq!(ns.expiration_key("abc"), "app:sessions:abc-expiration");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    bucket: String,
    suffix: String,
    /// Cached `prefix + bucket`
    scope: String,
}

impl Namespace {
    /// Creates a namespace with an empty bucket and the default suffix.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            scope: prefix.clone(),
            prefix,
            bucket: String::new(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Sets the bucket appended after the prefix.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self.scope = format!("{}{}", self.prefix, self.bucket);
        self
    }

    /// Sets the suffix that marks expiration keys.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `prefix + bucket`.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The backend key holding the value for `key`.
    pub fn stored_key(&self, key: &str) -> String {
        format!("{}{}", self.scope, key)
    }

    /// The backend key holding the expiry instant for `key`.
    pub fn expiration_key(&self, key: &str) -> String {
        format!("{}{}{}", self.scope, key, self.suffix)
    }

    /// Returns true if `backend_key` falls inside this namespace.
    #[inline]
    pub fn contains(&self, backend_key: &str) -> bool {
        backend_key.starts_with(&self.scope)
    }

    /// Recovers the logical key from a stored key.
    ///
    /// Returns `None` for keys outside the namespace and for expiration
    /// keys (anything ending with the suffix).
    pub fn logical_key<'a>(&self, backend_key: &'a str) -> Option<&'a str> {
        if backend_key.ends_with(&self.suffix) {
            return None;
        }
        backend_key.strip_prefix(&self.scope)
    }
}
