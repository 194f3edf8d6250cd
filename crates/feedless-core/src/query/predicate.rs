//! Structural predicates over log records.
//!
//! A small expression tree replaces ad hoc filter objects: leaves test one
//! field (`Eq`, `Absent`, `IsString`, `Contains`) and `And`/`Or` combine
//! them. [`Predicate::matches`] is the only evaluator, so every backend
//! shares the same matching semantics.

use crate::models::{Content, LogRecord};

/// Record fields a predicate can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Author,
    /// Present (and `true`) only on private records.
    Private,
    /// The content `type` tag.
    Type,
    Root,
    Recps,
    Text,
    About,
    Name,
    Contact,
    Following,
    Dest,
}

/// Comparison operand for [`Predicate::Eq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Bool(bool),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// A field value borrowed out of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(&'a str),
    Bool(bool),
    List(&'a [String]),
    /// Present but neither a string nor a bool (e.g. `{"remove": true}`).
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field present and equal to the operand.
    Eq(Field, Scalar),
    /// Field absent (`$not: true`).
    Absent(Field),
    /// Field present and a string (`$is: "string"`).
    IsString(Field),
    /// List field present and containing the value.
    Contains(Field, String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: Field, value: impl Into<Scalar>) -> Self {
        Predicate::Eq(field, value.into())
    }

    pub fn author(identity: &str) -> Self {
        Predicate::eq(Field::Author, identity)
    }

    pub fn content_type(kind: &str) -> Self {
        Predicate::eq(Field::Type, kind)
    }

    pub fn public() -> Self {
        Predicate::Absent(Field::Private)
    }

    pub fn private() -> Self {
        Predicate::eq(Field::Private, true)
    }

    pub fn contains(field: Field, value: &str) -> Self {
        Predicate::Contains(field, value.to_string())
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            Predicate::Eq(field, expected) => match (field_value(record, *field), expected) {
                (Some(FieldValue::Str(actual)), Scalar::Str(expected)) => actual == expected,
                (Some(FieldValue::Bool(actual)), Scalar::Bool(expected)) => actual == *expected,
                _ => false,
            },
            Predicate::Absent(field) => field_value(record, *field).is_none(),
            Predicate::IsString(field) => {
                matches!(field_value(record, *field), Some(FieldValue::Str(_)))
            }
            Predicate::Contains(field, needle) => match field_value(record, *field) {
                Some(FieldValue::List(items)) => items.iter().any(|item| item == needle),
                _ => false,
            },
            Predicate::And(all) => all.iter().all(|p| p.matches(record)),
            Predicate::Or(any) => any.iter().any(|p| p.matches(record)),
        }
    }
}

/// Looks up `field` on `record`; `None` means the field is absent.
pub fn field_value(record: &LogRecord, field: Field) -> Option<FieldValue<'_>> {
    let value = &record.value;
    match (field, &value.content) {
        (Field::Author, _) => Some(FieldValue::Str(&value.author)),
        (Field::Private, _) => value.private.then_some(FieldValue::Bool(true)),
        (Field::Type, content) => Some(FieldValue::Str(content.kind())),
        (Field::Root, Content::Post(post)) => post.root.as_deref().map(FieldValue::Str),
        (Field::Recps, Content::Post(post)) => post.recps.as_deref().map(FieldValue::List),
        (Field::Text, Content::Post(post)) => Some(FieldValue::Str(&post.text)),
        (Field::About, Content::About(about)) => Some(FieldValue::Str(&about.about)),
        (Field::Name, Content::About(about)) => about.name.as_ref().map(|name| {
            name.as_text().map_or(FieldValue::Object, FieldValue::Str)
        }),
        (Field::Contact, Content::Contact(contact)) => Some(FieldValue::Str(&contact.contact)),
        (Field::Following, Content::Contact(contact)) => contact.following.map(FieldValue::Bool),
        (Field::Dest, Content::Delete(delete)) => Some(FieldValue::Str(&delete.dest)),
        _ => None,
    }
}
