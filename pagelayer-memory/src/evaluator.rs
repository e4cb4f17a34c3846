//! Filter, sort and projection evaluation for in-memory documents.
//!
//! This module interprets query documents in the MongoDB dialect against
//! plain BSON documents: implicit equality, the comparison and membership
//! operators, `$exists`, `$not`, and the logical `$and` / `$or` combinators.
//! Field names may be dotted paths into embedded documents.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime};

use pagelayer_core::error::{PagingError, PagingResult};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 for comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or missing value
    Null,
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// String value
    String(&'a str),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Object id bytes
    ObjectId([u8; 12]),
    /// Boolean value
    Bool(bool),
    /// DateTime value
    DateTime(DateTime),
}

impl<'a> Comparable<'a> {
    /// Position of this value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Orders any two values, ranking by type first.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => self.partial_cmp(other).unwrap_or(Ordering::Equal),
            ordering => ordering,
        }
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(value.bytes()),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> From<Option<&'a Bson>> for Comparable<'a> {
    fn from(bson: Option<&'a Bson>) -> Self {
        bson.map(Comparable::from).unwrap_or(Comparable::Null)
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path inside `document`.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Reads an integral value, accepting whole doubles.
pub(crate) fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(value) => Some(i64::from(*value)),
        Bson::Int64(value) => Some(*value),
        Bson::Double(value) if value.fract() == 0.0 => Some(*value as i64),
        _ => None,
    }
}

fn unsupported(what: &str, name: &str) -> PagingError {
    PagingError::backend(format!("unsupported {what}: {name}"))
}

/// Evaluates filter documents against a single document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns whether the document satisfies every clause of `filter`.
    pub fn evaluate(&self, filter: &Document) -> PagingResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(condition)?,
                "$or" => self.any(condition)?,
                op if op.starts_with('$') => return Err(unsupported("query operator", op)),
                field => Self::matches(lookup(self.document, field), condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> PagingResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn clauses(condition: &Bson) -> PagingResult<Vec<&Document>> {
        condition
            .as_array()
            .ok_or_else(|| PagingError::backend("logical operators require an array of documents"))?
            .iter()
            .map(|clause| {
                clause
                    .as_document()
                    .ok_or_else(|| PagingError::backend("logical operators require an array of documents"))
            })
            .collect()
    }

    fn all(&self, condition: &Bson) -> PagingResult<bool> {
        for clause in Self::clauses(condition)? {
            if !self.evaluate(clause)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any(&self, condition: &Bson) -> PagingResult<bool> {
        for clause in Self::clauses(condition)? {
            if self.evaluate(clause)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn is_operator_document(condition: &Bson) -> Option<&Document> {
        condition
            .as_document()
            .filter(|doc| !doc.is_empty() && doc.keys().all(|key| key.starts_with('$')))
    }

    fn matches(value: Option<&Bson>, condition: &Bson) -> PagingResult<bool> {
        let Some(operators) = Self::is_operator_document(condition) else {
            return Ok(Self::equals(value, condition));
        };

        for (op, operand) in operators {
            let matched = match op.as_str() {
                "$eq" => Self::equals(value, operand),
                "$ne" => !Self::equals(value, operand),
                "$gt" | "$gte" | "$lt" | "$lte" => match value {
                    Some(value) => match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
                        Some(ordering) => match op.as_str() {
                            "$gt" => ordering == Ordering::Greater,
                            "$gte" => ordering != Ordering::Less,
                            "$lt" => ordering == Ordering::Less,
                            _ => ordering != Ordering::Greater,
                        },
                        None => false,
                    },
                    None => false,
                },
                "$in" => Self::members(operand)?
                    .iter()
                    .any(|candidate| Self::equals(value, candidate)),
                "$nin" => !Self::members(operand)?
                    .iter()
                    .any(|candidate| Self::equals(value, candidate)),
                "$exists" => value.is_some() == truthy(operand),
                "$not" => !Self::matches(value, operand)?,
                other => return Err(unsupported("query operator", other)),
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn members(operand: &Bson) -> PagingResult<&Vec<Bson>> {
        operand
            .as_array()
            .ok_or_else(|| PagingError::backend("$in and $nin require an array"))
    }

    /// Equality with array-element matching: a scalar target matches an array
    /// field containing it.
    fn equals(value: Option<&Bson>, target: &Bson) -> bool {
        match (value, target) {
            (Some(Bson::Array(items)), target) if !matches!(target, Bson::Array(_)) => items
                .iter()
                .any(|item| Comparable::from(item) == Comparable::from(target)),
            (value, target) => Comparable::from(value) == Comparable::from(target),
        }
    }
}

/// Truthiness of a projection or `$exists` operand.
pub(crate) fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

/// Sorts `documents` in place following a sort specification such as
/// `{ "age": -1, "name": 1 }`. The sort is stable.
pub(crate) fn sort_documents(documents: &mut [Document], spec: &Document) -> PagingResult<()> {
    let keys = spec
        .iter()
        .map(|(field, direction)| match as_i64(direction) {
            Some(1) => Ok((field.as_str(), false)),
            Some(-1) => Ok((field.as_str(), true)),
            _ => Err(PagingError::backend(format!("invalid sort direction for {field}"))),
        })
        .collect::<PagingResult<Vec<_>>>()?;

    documents.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = Comparable::from(lookup(a, field))
                .total_cmp(&Comparable::from(lookup(b, field)));
            let ordering = if *descending { ordering.reverse() } else { ordering };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });

    Ok(())
}

/// Applies an inclusion or exclusion projection to the top-level fields of `document`.
///
/// `_id` is kept by an inclusion projection unless explicitly excluded.
pub(crate) fn project(document: &Document, projection: &Document) -> PagingResult<Document> {
    for (field, value) in projection {
        if !matches!(value, Bson::Boolean(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) {
            return Err(unsupported("projection value for field", field));
        }
    }

    let inclusion = projection
        .iter()
        .any(|(field, value)| field != "_id" && truthy(value));

    if inclusion {
        let keep_id = projection.get("_id").map(truthy).unwrap_or(true);

        Ok(document
            .iter()
            .filter(|(field, _)| {
                if field.as_str() == "_id" {
                    keep_id
                } else {
                    projection.get(field.as_str()).map(truthy).unwrap_or(false)
                }
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect())
    } else {
        Ok(document
            .iter()
            .filter(|(field, _)| projection.get(field.as_str()).map(truthy).unwrap_or(true))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect())
    }
}
