use std::collections::BTreeMap;

use serde_json::Value;

/// Fields of a structured listing record that may carry the file name, in
/// lookup order.
const NAME_FIELDS: [&str; 5] = ["name", "filename", "file_name", "fileName", "key"];

/// One item of a store listing. Backends either report bare names or
/// structured records carrying a name among other metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Name(String),
    Record(BTreeMap<String, Value>),
}

impl Entry {
    pub fn name(name: impl Into<String>) -> Self {
        Entry::Name(name.into())
    }

    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Entry::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Reduces a listing entry to a bare file name.
///
/// Returns `None` for records without a string-valued name field; callers
/// skip those entries rather than rendering the record.
pub fn normalize(entry: &Entry) -> Option<String> {
    match entry {
        Entry::Name(name) => Some(name.clone()),
        Entry::Record(fields) => NAME_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_owned),
    }
}
