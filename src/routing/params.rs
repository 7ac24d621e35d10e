//! Conversions between captured strings and typed route values.

use uuid::Uuid;

/// A value that can live in a path segment or query parameter.
///
/// `parse` may reject (a malformed id). `render` returns `None` for values
/// that have no parseable form, so a printed link always routes back: for
/// every `v` with `render(v) == Some(r)`, `parse(&r) == Some(v)`.
pub trait Param: Sized {
    /// Short name used in site map descriptions (`int`, `uuid`, ...).
    const KIND: &'static str;

    fn parse(raw: &str) -> Option<Self>;

    fn render(&self) -> Option<String>;
}

macro_rules! int_param {
    ($($ty:ty),*) => {
        $(
            impl Param for $ty {
                const KIND: &'static str = "int";

                fn parse(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }

                fn render(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

int_param!(i32, i64, u32, u64);

impl Param for String {
    const KIND: &'static str = "string";

    fn parse(raw: &str) -> Option<Self> {
        (!raw.is_empty()).then(|| raw.to_string())
    }

    /// Empty strings render to nothing: an empty segment or query value
    /// would not parse back.
    fn render(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.clone())
    }
}

impl Param for Uuid {
    const KIND: &'static str = "uuid";

    fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok()
    }

    fn render(&self) -> Option<String> {
        Some(self.hyphenated().to_string())
    }
}
