//! Status probes: one fetch-and-classify cycle against the remote API.
//!
//! A probe wraps a [`Lookup`] and maps its outcome to an [`Observation`]:
//!
//! - a classified absence becomes a successful observation labeled [`NOT_FOUND`]
//!   with no snapshot, since absence is itself a meaningful state;
//! - any other lookup failure becomes a [`ProbeError`] (implied label [`UNKNOWN`]);
//! - a found resource is labeled by a domain-supplied extractor.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use log::debug;

use crate::error::{FindError, ProbeError};
use crate::finder::Lookup;

/// Label reported when the resource (or a nested element) is absent.
pub const NOT_FOUND: &str = "NotFound";

/// Label reported when the probe cannot classify the resource.
pub const UNKNOWN: &str = "Unknown";

/// Classification token for a snapshot's lifecycle position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateLabel(String);

impl StateLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn not_found() -> Self {
        Self::new(NOT_FOUND)
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_not_found(&self) -> bool {
        self.0 == NOT_FOUND
    }
}

impl From<&str> for StateLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for StateLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl PartialEq<str> for StateLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of state labels, e.g. the pending or target states of a wait.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeSet<StateLabel>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, label: &StateLabel) -> bool {
        self.0.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateLabel> {
        self.0.iter()
    }

    /// Labels present in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }
}

impl<L: Into<StateLabel>> FromIterator<L> for LabelSet {
    fn from_iter<I: IntoIterator<Item = L>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(StateLabel::as_str).collect();
        f.write_str(&labels.join(", "))
    }
}

/// The result of a successful probe: the fetched snapshot (if any) and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<T> {
    pub snapshot: Option<T>,
    pub label: StateLabel,
}

impl<T> Observation<T> {
    pub fn new(snapshot: T, label: impl Into<StateLabel>) -> Self {
        Self {
            snapshot: Some(snapshot),
            label: label.into(),
        }
    }

    /// The resource is gone: no snapshot, labeled [`NOT_FOUND`].
    pub fn absent() -> Self {
        Self {
            snapshot: None,
            label: StateLabel::not_found(),
        }
    }
}

/// One fetch-and-classify cycle, invoked repeatedly by the waiter.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    type Snapshot: Send;

    async fn probe(&self) -> Result<Observation<Self::Snapshot>, ProbeError>;
}

/// Normalize a lookup outcome into an observation.
pub fn classify<T, E>(found: Result<T, FindError>, extract: E) -> Result<Observation<T>, ProbeError>
where
    E: FnOnce(&T) -> StateLabel,
{
    match found {
        Ok(snapshot) => {
            let label = extract(&snapshot);
            Ok(Observation {
                snapshot: Some(snapshot),
                label,
            })
        }
        Err(FindError::NotFound { resource }) => {
            debug!("{resource} not found, reporting state '{NOT_FOUND}'");
            Ok(Observation::absent())
        }
        Err(FindError::Transport(source)) => Err(ProbeError::new(source)),
    }
}

/// Label of the first nested element accepted by `matches`, or `fallback` when none is.
///
/// Domain mappers use this for two different defaults: a distinguished "not found"
/// label when a named sub-resource (an alias, say) is missing, and a terminal label
/// when no in-flight action of a given kind exists (absence implies completion).
pub fn nested_label<'a, C, I, M, F>(
    children: I,
    matches: M,
    label_of: F,
    fallback: StateLabel,
) -> StateLabel
where
    C: 'a,
    I: IntoIterator<Item = &'a C>,
    M: Fn(&C) -> bool,
    F: Fn(&C) -> StateLabel,
{
    children
        .into_iter()
        .find(|child| matches(*child))
        .map(|child| label_of(child))
        .unwrap_or(fallback)
}

/// A [`StatusProbe`] built from a [`Lookup`] and a pure label extractor.
pub struct LookupProbe<L, E> {
    lookup: L,
    extract: E,
}

impl<L, E> LookupProbe<L, E> {
    pub fn new(lookup: L, extract: E) -> Self {
        Self { lookup, extract }
    }
}

#[async_trait]
impl<L, E> StatusProbe for LookupProbe<L, E>
where
    L: Lookup,
    E: Fn(&L::Resource) -> StateLabel + Send + Sync,
{
    type Snapshot = L::Resource;

    async fn probe(&self) -> Result<Observation<L::Resource>, ProbeError> {
        let found = self.lookup.lookup().await;
        classify(found, &self.extract)
    }
}
