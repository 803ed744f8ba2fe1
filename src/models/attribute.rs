use serde::{Deserialize, Serialize};

/// A normalized `(name, scope, value)` fact sent to the inventory service.
///
/// `value` holds the canonical JSON encoding of the original payload value,
/// so a string `"abc"` travels as `"\"abc\""` and a number `3` as `"3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub scope: String,
    pub value: String,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        scope: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            value: value.into(),
        }
    }
}
