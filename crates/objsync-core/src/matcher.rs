//! Structural equivalence between a descriptor and a discovered object.
//!
//! A mismatch is an ordinary outcome, not an error: callers log it and
//! recreate the resource.

use std::fmt;

use crate::codec::normalize_hex;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::object::DiscoveredResource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// Nothing was found on the ledger.
    Missing,
    /// A package descriptor matched a non-package object.
    NotAPackage,
    TypeMismatch { expected: String, actual: String },
    /// Neither the label nor the feed id agrees.
    IdentityMismatch,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "object not found"),
            Self::NotAPackage => write!(f, "object is not a package"),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "type {actual} does not contain {expected}")
            }
            Self::IdentityMismatch => write!(f, "neither label nor feed id matches"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    Mismatch(MismatchReason),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// A previously recorded resource together with its live snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Candidate<'a> {
    pub label: Option<&'a str>,
    pub feed_id: Option<&'a str>,
    pub resource: Option<&'a DiscoveredResource>,
}

/// Type rule only.
pub fn matches_type(descriptor: &ResourceDescriptor, resource: &DiscoveredResource) -> MatchOutcome {
    if descriptor.kind() == ResourceKind::Package {
        return if resource.is_package {
            MatchOutcome::Matched
        } else {
            MatchOutcome::Mismatch(MismatchReason::NotAPackage)
        };
    }

    match descriptor.type_suffix() {
        Some(suffix) if !resource.type_contains(suffix) => {
            MatchOutcome::Mismatch(MismatchReason::TypeMismatch {
                expected: suffix.to_string(),
                actual: resource.object_type.clone(),
            })
        }
        _ => MatchOutcome::Matched,
    }
}

/// Identity rule for label-addressed resources: inclusive OR of a
/// normalized feed id match and an exact label match.
///
/// Descriptors without a feed id always pass.
pub fn matches_identity(
    descriptor: &ResourceDescriptor,
    label: Option<&str>,
    feed_id: Option<&str>,
) -> bool {
    match descriptor.feed_id() {
        Some(expected_feed) => identity_matches(descriptor.label(), expected_feed, label, feed_id),
        None => true,
    }
}

/// `feed_id` equal after hex normalization, or `label` equal verbatim.
pub fn identity_matches(
    expected_label: &str,
    expected_feed_id: &str,
    label: Option<&str>,
    feed_id: Option<&str>,
) -> bool {
    let feed_match =
        feed_id.is_some_and(|id| normalize_hex(id) == normalize_hex(expected_feed_id));
    let label_match = label.is_some_and(|l| l == expected_label);

    feed_match || label_match
}

/// Full decision: identity first, then presence and type.
pub fn matches(descriptor: &ResourceDescriptor, candidate: &Candidate<'_>) -> MatchOutcome {
    if !matches_identity(descriptor, candidate.label, candidate.feed_id) {
        return MatchOutcome::Mismatch(MismatchReason::IdentityMismatch);
    }

    match candidate.resource {
        None => MatchOutcome::Mismatch(MismatchReason::Missing),
        Some(resource) => matches_type(descriptor, resource),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MoveFields;
    use crate::id::ObjectId;
    use crate::object::Owner;

    const FEED_ID: &str = "0x202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";
    const PYTH: ObjectId = ObjectId::short(0xb);

    fn feed_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::price_feed("MOCK_SUI_FEED", FEED_ID, PYTH)
    }

    fn price_info() -> DiscoveredResource {
        DiscoveredResource {
            object_id: ObjectId::short(0x77),
            object_type: format!("{PYTH}::price_info::PriceInfoObject"),
            owner: Owner::Shared {
                initial_shared_version: 3,
            },
            version: 3,
            digest: None,
            is_package: false,
            fields: MoveFields::default(),
        }
    }

    #[test]
    fn test_inclusive_or_identity() {
        let desc = feed_descriptor();

        assert!(matches_identity(&desc, Some("MOCK_SUI_FEED"), None));
        assert!(matches_identity(&desc, Some("MOCK_SUI_FEED"), Some("0x00")));
        assert!(matches_identity(&desc, None, Some(&FEED_ID.to_ascii_uppercase()[2..])));
        assert!(matches_identity(&desc, Some("OTHER"), Some(FEED_ID)));
        assert!(!matches_identity(&desc, Some("OTHER"), Some("0x01")));
        assert!(!matches_identity(&desc, None, None));
    }

    #[test]
    fn test_matches_price_feed() {
        let desc = feed_descriptor();
        let resource = price_info();
        let candidate = Candidate {
            label: Some("MOCK_SUI_FEED"),
            feed_id: None,
            resource: Some(&resource),
        };
        assert!(matches(&desc, &candidate).is_matched());
    }

    #[test]
    fn test_type_mismatch() {
        let desc = feed_descriptor();
        let mut resource = price_info();
        resource.object_type = "0x2::coin::Coin<0x2::sui::SUI>".into();
        let candidate = Candidate {
            label: Some("MOCK_SUI_FEED"),
            feed_id: Some(FEED_ID),
            resource: Some(&resource),
        };
        assert!(matches!(
            matches(&desc, &candidate),
            MatchOutcome::Mismatch(MismatchReason::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_other_package_mismatches() {
        let desc = ResourceDescriptor::price_feed("MOCK_SUI_FEED", FEED_ID, ObjectId::short(0xc0));
        let resource = price_info();
        assert!(!matches_type(&desc, &resource).is_matched());
    }

    #[test]
    fn test_missing_resource() {
        let desc = feed_descriptor();
        let candidate = Candidate {
            label: Some("MOCK_SUI_FEED"),
            ..Candidate::default()
        };
        assert_eq!(
            matches(&desc, &candidate),
            MatchOutcome::Mismatch(MismatchReason::Missing)
        );
    }

    #[test]
    fn test_package_rule() {
        let desc = ResourceDescriptor::package("pyth-mock");
        let mut resource = price_info();
        assert_eq!(
            matches_type(&desc, &resource),
            MatchOutcome::Mismatch(MismatchReason::NotAPackage)
        );
        resource.is_package = true;
        resource.object_type = "package".into();
        assert!(matches_type(&desc, &resource).is_matched());
    }
}
