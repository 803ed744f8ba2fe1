//! # Attribute Mapper
//!
//! Turns a record's identity payload into inventory attributes. Output is
//! sorted by name, so unchanged data always produces byte-identical upserts
//! whatever the payload's iteration order.

use crate::constants::IDENTITY_SCOPE;
use crate::error::{PropagationError, PropagationResult};
use crate::models::{Attribute, Record};
use serde::Serialize;

/// Map identity payload entries to `identity`-scoped attributes.
///
/// Each value is encoded as canonical JSON. A single value that cannot be
/// encoded fails the whole mapping; no partial list is returned. Duplicate
/// keys are rejected.
pub fn identity_attributes<'a, K, V, I>(payload: I) -> PropagationResult<Vec<Attribute>>
where
    I: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + ?Sized + 'a,
    V: Serialize + ?Sized + 'a,
{
    let mut attributes = payload
        .into_iter()
        .map(|(key, value)| -> PropagationResult<Attribute> {
            let name = key.as_ref();
            let encoded = serde_json::to_string(value).map_err(|e| PropagationError::Encoding {
                attribute: name.to_string(),
                message: e.to_string(),
            })?;
            Ok(Attribute::new(name, IDENTITY_SCOPE, encoded))
        })
        .collect::<PropagationResult<Vec<_>>>()?;

    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(pair) = attributes.windows(2).find(|pair| pair[0].name == pair[1].name) {
        return Err(PropagationError::Encoding {
            attribute: pair[0].name.clone(),
            message: "duplicate attribute name".to_string(),
        });
    }

    Ok(attributes)
}

/// Attributes derived from a record's identity payload
pub fn record_attributes(record: &Record) -> PropagationResult<Vec<Attribute>> {
    identity_attributes(&record.id_data)
}
