//! Normalized command results

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Job, JobId};

/// One value in a result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

/// Outcome of one command: either nothing to show, or a flat field map.
///
/// Never mutated after the mapper returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Unit,
    Fields(BTreeMap<String, FieldValue>),
}

impl CommandResult {
    /// `{id}`
    pub fn id(id: JobId) -> Self {
        Self::from_pairs([("id", FieldValue::Text(id.to_string()))])
    }

    /// `{body}`
    pub fn body(job: &Job) -> Self {
        Self::from_pairs([("body", FieldValue::Text(job.body_text()))])
    }

    /// `{id, body}`
    pub fn job(job: &Job) -> Self {
        Self::from_pairs([
            ("id", FieldValue::Text(job.id.to_string())),
            ("body", FieldValue::Text(job.body_text())),
        ])
    }

    /// Counter map as returned by the stats family.
    pub fn stats(stats: BTreeMap<String, String>) -> Self {
        CommandResult::Fields(
            stats
                .into_iter()
                .map(|(k, v)| (k, FieldValue::Text(v)))
                .collect(),
        )
    }

    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        CommandResult::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, CommandResult::Unit)
    }

    /// Look up a text field.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self {
            CommandResult::Fields(fields) => match fields.get(key) {
                Some(FieldValue::Text(s)) => Some(s.as_str()),
                _ => None,
            },
            CommandResult::Unit => None,
        }
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            CommandResult::Fields(fields) => Some(fields),
            CommandResult::Unit => None,
        }
    }
}
