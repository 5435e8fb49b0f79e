use std::collections::BTreeMap;

/// A single condition on the labels of a source object which, if met, forces `target` on the
/// converted object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecedenceRule<T> {
    pub label_key: String,
    pub expected_value: String,
    pub target: T,
}

impl<T> PrecedenceRule<T> {
    pub fn new(label_key: impl Into<String>, expected_value: impl Into<String>, target: T) -> Self {
        Self {
            label_key: label_key.into(),
            expected_value: expected_value.into(),
            target,
        }
    }

    /// Returns `true` if `labels` contain the key of this rule with exactly the expected value.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels
            .get(&self.label_key)
            .is_some_and(|value| *value == self.expected_value)
    }
}

/// An ordered collection of [`PrecedenceRule`]s.
///
/// The rules are evaluated once against the labels of the source object, before any field is
/// converted. The caller then applies the matched targets to the converted object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecedenceRules<T>(Vec<PrecedenceRule<T>>);

impl<T> Default for PrecedenceRules<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> FromIterator<PrecedenceRule<T>> for PrecedenceRules<T> {
    fn from_iter<I: IntoIterator<Item = PrecedenceRule<T>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> PrecedenceRules<T> {
    pub fn iter(&self) -> impl Iterator<Item = &PrecedenceRule<T>> {
        self.0.iter()
    }

    /// Returns the targets of all rules matching `labels`, in rule order.
    pub fn matching<'a>(
        &'a self,
        labels: Option<&'a BTreeMap<String, String>>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.0
            .iter()
            .filter(move |rule| labels.is_some_and(|labels| rule.matches(labels)))
            .map(|rule| &rule.target)
    }
}
