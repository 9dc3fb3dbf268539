use crate::graph_catalog::{AttributeSchema, FieldContainer, RelationshipSchema};

/// Suffix operators accepted after an attribute name (`title_CONTAINS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    Not,
    In,
    NotIn,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Matches,
    Includes,
    NotIncludes,
    Distance,
}

/// Quantifiers accepted after a relationship or connection field (`actors_SOME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    All,
    None,
    Single,
}

/// Longest suffixes first so `_NOT_IN` wins over `_IN`.
const ATTRIBUTE_SUFFIXES: [(&str, FilterOperator); 18] = [
    ("_NOT_STARTS_WITH", FilterOperator::NotStartsWith),
    ("_NOT_ENDS_WITH", FilterOperator::NotEndsWith),
    ("_NOT_INCLUDES", FilterOperator::NotIncludes),
    ("_NOT_CONTAINS", FilterOperator::NotContains),
    ("_STARTS_WITH", FilterOperator::StartsWith),
    ("_ENDS_WITH", FilterOperator::EndsWith),
    ("_INCLUDES", FilterOperator::Includes),
    ("_CONTAINS", FilterOperator::Contains),
    ("_DISTANCE", FilterOperator::Distance),
    ("_MATCHES", FilterOperator::Matches),
    ("_NOT_IN", FilterOperator::NotIn),
    ("_NOT", FilterOperator::Not),
    ("_LTE", FilterOperator::LessThanEqual),
    ("_GTE", FilterOperator::GreaterThanEqual),
    ("_EQ", FilterOperator::Equal),
    ("_IN", FilterOperator::In),
    ("_LT", FilterOperator::LessThan),
    ("_GT", FilterOperator::GreaterThan),
];

const QUANTIFIER_SUFFIXES: [(&str, Quantifier); 4] = [
    ("_SINGLE", Quantifier::Single),
    ("_SOME", Quantifier::Some),
    ("_NONE", Quantifier::None),
    ("_ALL", Quantifier::All),
];

/// Operators of the `count` entry inside an aggregate filter.
pub const COUNT_SUFFIXES: [(&str, FilterOperator); 5] = [
    ("count_LTE", FilterOperator::LessThanEqual),
    ("count_GTE", FilterOperator::GreaterThanEqual),
    ("count_LT", FilterOperator::LessThan),
    ("count_GT", FilterOperator::GreaterThan),
    ("count", FilterOperator::Equal),
];

/// What a `where` key addresses on its owner.
#[derive(Debug, Clone, Copy)]
pub enum FilterKey<'s> {
    Attribute(&'s AttributeSchema, FilterOperator),
    Relationship(&'s RelationshipSchema, Quantifier),
    Connection(&'s RelationshipSchema, Quantifier),
    Aggregate(&'s RelationshipSchema),
}

impl FilterOperator {
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            FilterOperator::LessThan
                | FilterOperator::LessThanEqual
                | FilterOperator::GreaterThan
                | FilterOperator::GreaterThanEqual
        )
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            FilterOperator::Contains
                | FilterOperator::NotContains
                | FilterOperator::StartsWith
                | FilterOperator::NotStartsWith
                | FilterOperator::EndsWith
                | FilterOperator::NotEndsWith
        )
    }
}

/// Split `<field>_<OPERATOR>` without consulting a schema. Used for claim
/// filters, whose fields are not declared anywhere.
pub fn split_key(key: &str) -> (&str, FilterOperator) {
    for (suffix, operator) in ATTRIBUTE_SUFFIXES {
        if let Some(field) = key.strip_suffix(suffix) {
            if !field.is_empty() {
                return (field, operator);
            }
        }
    }
    (key, FilterOperator::Equal)
}

/// Resolve a `where` key against the fields of `owner`.
pub fn parse_key<'s>(owner: &'s dyn FieldContainer, key: &str) -> Option<FilterKey<'s>> {
    if let Some(attribute) = owner.attribute(key) {
        return Some(FilterKey::Attribute(attribute, FilterOperator::Equal));
    }
    if let Some(relationship) = owner.relationship_named(key) {
        return Some(FilterKey::Relationship(relationship, Quantifier::Some));
    }
    if let Some(field) = key.strip_suffix("Connection") {
        if let Some(relationship) = owner.relationship_named(field) {
            return Some(FilterKey::Connection(relationship, Quantifier::Some));
        }
    }
    if let Some(field) = key.strip_suffix("Aggregate") {
        if let Some(relationship) = owner.relationship_named(field) {
            return Some(FilterKey::Aggregate(relationship));
        }
    }

    for (suffix, quantifier) in QUANTIFIER_SUFFIXES {
        let Some(field) = key.strip_suffix(suffix) else {
            continue;
        };
        if let Some(relationship) = owner.relationship_named(field) {
            return Some(FilterKey::Relationship(relationship, quantifier));
        }
        if let Some(relationship) = field
            .strip_suffix("Connection")
            .and_then(|f| owner.relationship_named(f))
        {
            return Some(FilterKey::Connection(relationship, quantifier));
        }
    }

    for (suffix, operator) in ATTRIBUTE_SUFFIXES {
        let Some(field) = key.strip_suffix(suffix) else {
            continue;
        };
        if let Some(attribute) = owner.attribute(field) {
            return Some(FilterKey::Attribute(attribute, operator));
        }
        if operator == FilterOperator::Not {
            // Deprecated negated relationship filter, same as `_NONE`.
            if let Some(relationship) = owner.relationship_named(field) {
                return Some(FilterKey::Relationship(relationship, Quantifier::None));
            }
        }
    }
    None
}
