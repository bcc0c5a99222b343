//! This module contains the field-level checks that make up a checkpoint's
//! table of invariants.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use itertools::Itertools;

use crate::{checker::Checkpoint, error::assertion::Failure, snapshot::value::Value};

/// What a check requires of the value it is given.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expectation {
    /// The value must be exactly this.
    Equals(Value),

    /// The value must be strictly greater than this. Only values with a natural
    /// order can satisfy this.
    GreaterThan(Value),

    /// The value must be one of these.
    OneOf(Vec<Value>),

    /// The value must be the boolean `true`.
    IsTrue,

    /// The value must be the boolean `false`.
    IsFalse,
}

impl Expectation {
    /// Requires equality with `value`.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    /// Requires the value to exceed `bound`.
    pub fn greater_than(bound: impl Into<Value>) -> Self {
        Self::GreaterThan(bound.into())
    }

    /// Requires the boolean `value`.
    #[must_use]
    pub fn is(value: bool) -> Self {
        if value {
            Self::IsTrue
        } else {
            Self::IsFalse
        }
    }

    /// Checks if `actual` meets this expectation.
    #[must_use]
    pub fn is_met_by(&self, actual: &Value) -> bool {
        match self {
            Self::Equals(expected) => actual == expected,
            Self::GreaterThan(bound) => actual.compare(bound) == Some(Ordering::Greater),
            Self::OneOf(options) => options.contains(actual),
            Self::IsTrue => *actual == Value::Bool(true),
            Self::IsFalse => *actual == Value::Bool(false),
        }
    }
}

impl Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals(value) => write!(f, "{value}"),
            Self::GreaterThan(bound) => write!(f, "a value greater than {bound}"),
            Self::OneOf(options) => write!(f, "one of [{}]", options.iter().join(", ")),
            Self::IsTrue => write!(f, "true"),
            Self::IsFalse => write!(f, "false"),
        }
    }
}

/// A single entry of a checkpoint table: the value decoded for a field and
/// what that value is required to be.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Check {
    pub field:       &'static str,
    pub actual:      Value,
    pub expectation: Expectation,
}

impl Check {
    /// Creates a check that `actual`, decoded from `field`, meets
    /// `expectation`.
    pub fn new(field: &'static str, actual: impl Into<Value>, expectation: Expectation) -> Self {
        let actual = actual.into();
        Self {
            field,
            actual,
            expectation,
        }
    }

    /// Evaluates the check as part of the table for `checkpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] describing the violation if the expectation is not met.
    pub fn evaluate(self, checkpoint: Checkpoint) -> Result<(), Failure> {
        if self.expectation.is_met_by(&self.actual) {
            Ok(())
        } else {
            Err(Failure {
                checkpoint,
                field: self.field,
                expected: self.expectation,
                actual: self.actual,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        checker::{
            check::{Check, Expectation},
            Checkpoint,
        },
        lifecycle::Stage,
        snapshot::value::Value,
    };

    #[test]
    fn greater_than_is_strict() {
        let bound = Expectation::greater_than(Value::integer(10u32));

        assert!(bound.is_met_by(&Value::integer(11u32)));
        assert!(!bound.is_met_by(&Value::integer(10u32)));
        assert!(!bound.is_met_by(&Value::ascii("11")));
    }

    #[test]
    fn membership_and_truth() {
        let stages = Expectation::OneOf(vec![Stage::Active.into(), Stage::Terminated.into()]);
        assert!(stages.is_met_by(&Stage::Active.into()));
        assert!(!stages.is_met_by(&Stage::EthFunding.into()));

        assert!(Expectation::is(true).is_met_by(&Value::Bool(true)));
        assert!(!Expectation::is(false).is_met_by(&Value::Bool(true)));
        assert!(!Expectation::IsTrue.is_met_by(&Value::integer(1u32)));
    }

    #[test]
    fn failures_name_the_field_and_values() {
        let failure = Check::new("paused", false, Expectation::IsTrue)
            .evaluate(Checkpoint::PostInitialized)
            .unwrap_err();

        assert_eq!(failure.field, "paused");
        assert_eq!(failure.actual, Value::Bool(false));
        assert_eq!(
            failure.to_string(),
            "PostInitialized check failed for `paused`: expected true but found false"
        );
    }

    #[test]
    fn membership_failures_list_the_options() {
        let failure = Check::new(
            "stage",
            Stage::PreFunding,
            Expectation::OneOf(vec![Stage::Active.into(), Stage::Terminated.into()]),
        )
        .evaluate(Checkpoint::PostActive)
        .unwrap_err();

        assert_eq!(failure.expected.to_string(), "one of [Active (6), Terminated (7)]");
    }
}
