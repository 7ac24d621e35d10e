//! CSRF tokens and posted forms.

use rand::distributions::Alphanumeric;
use rand::Rng;
use subtle::ConstantTimeEq;

/// Field name every protected form posts its token under.
pub const CSRF_FIELD: &str = "csrf_token";

/// A fresh 32-character token.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Constant-time token comparison.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// A urlencoded form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedForm {
    fields: Vec<(String, String)>,
}

impl PostedForm {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            fields: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value posted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True if the form carries `expected` as its CSRF token.
    pub fn has_token(&self, expected: &str) -> bool {
        self.get(CSRF_FIELD)
            .map(|provided| tokens_match(expected, provided))
            .unwrap_or(false)
    }
}
