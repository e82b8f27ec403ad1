use std::borrow::Cow;
use std::fmt;

/// Key of a significant-terms bucket.
///
/// Buckets from different shards are the same logical bucket when their
/// [`key_as_string`](TermKey::key_as_string) representations are equal.
pub trait TermKey: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Aggregation type name for results keyed by this type
    const AGGREGATION_TYPE: &'static str;

    fn key_as_string(&self) -> Cow<'_, str>;
}

impl TermKey for String {
    const AGGREGATION_TYPE: &'static str = "significant_string_terms";

    fn key_as_string(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl TermKey for i64 {
    const AGGREGATION_TYPE: &'static str = "significant_long_terms";

    fn key_as_string(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}
