//! Aggregation pipeline interpreter for the in-memory backend.
//!
//! Supports the stages a paged aggregate needs: `$match`, `$sort`, `$skip`,
//! `$limit`, `$count`, `$project` and `$facet`.

use bson::{Bson, Document};

use pagelayer_core::error::{PagingError, PagingResult};

use crate::evaluator::{DocumentEvaluator, as_i64, project, sort_documents};

/// Runs `stages` in order over `documents`.
pub(crate) fn run(documents: Vec<Document>, stages: &[Document]) -> PagingResult<Vec<Document>> {
    stages
        .iter()
        .try_fold(documents, |documents, stage| run_stage(documents, stage))
}

fn run_stage(mut documents: Vec<Document>, stage: &Document) -> PagingResult<Vec<Document>> {
    let mut entries = stage.iter();
    let (Some((name, argument)), None) = (entries.next(), entries.next()) else {
        return Err(PagingError::backend("a pipeline stage must have exactly one field"));
    };

    match name.as_str() {
        "$match" => DocumentEvaluator::filter_documents(documents.iter(), document_argument(name, argument)?),
        "$sort" => {
            sort_documents(&mut documents, document_argument(name, argument)?)?;
            Ok(documents)
        }
        "$skip" => {
            let skip = count_argument(name, argument)?;
            Ok(documents.into_iter().skip(skip).collect())
        }
        "$limit" => match count_argument(name, argument)? {
            0 => Err(PagingError::backend("$limit must be positive")),
            limit => Ok(documents.into_iter().take(limit).collect()),
        },
        "$count" => {
            let field = argument
                .as_str()
                .filter(|field| !field.is_empty() && !field.starts_with('$'))
                .ok_or_else(|| PagingError::backend("$count requires a field name"))?;

            if documents.is_empty() {
                return Ok(Vec::new());
            }

            let count = documents.len() as i64;
            let mut result = Document::new();
            result.insert(
                field,
                i32::try_from(count).map(Bson::Int32).unwrap_or(Bson::Int64(count)),
            );

            Ok(vec![result])
        }
        "$project" => {
            let projection = document_argument(name, argument)?;

            documents
                .iter()
                .map(|document| project(document, projection))
                .collect()
        }
        "$facet" => {
            let mut result = Document::new();

            for (arm, sub_stages) in document_argument(name, argument)? {
                let sub_stages = sub_stages
                    .as_array()
                    .ok_or_else(|| PagingError::backend(format!("$facet arm {arm} must be an array")))?
                    .iter()
                    .map(|stage| {
                        stage
                            .as_document()
                            .cloned()
                            .ok_or_else(|| PagingError::backend(format!("$facet arm {arm} must contain stages")))
                    })
                    .collect::<PagingResult<Vec<_>>>()?;

                let output = run(documents.clone(), &sub_stages)?;
                result.insert(arm.clone(), output.into_iter().map(Bson::Document).collect::<Vec<_>>());
            }

            Ok(vec![result])
        }
        other => Err(PagingError::backend(format!("unsupported pipeline stage: {other}"))),
    }
}

fn document_argument<'a>(name: &str, argument: &'a Bson) -> PagingResult<&'a Document> {
    argument
        .as_document()
        .ok_or_else(|| PagingError::backend(format!("{name} requires a document")))
}

fn count_argument(name: &str, argument: &Bson) -> PagingResult<usize> {
    as_i64(argument)
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| PagingError::backend(format!("{name} requires a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn numbers(count: i32) -> Vec<Document> {
        (1..=count).map(|n| doc! { "n": n, "even": n % 2 == 0 }).collect()
    }

    #[test]
    fn match_sort_skip_limit() {
        let output = run(
            numbers(10),
            &[
                doc! { "$match": { "even": true } },
                doc! { "$sort": { "n": -1 } },
                doc! { "$skip": 1 },
                doc! { "$limit": 2_i64 },
            ],
        )
        .unwrap();

        assert_eq!(
            output,
            vec![doc! { "n": 8, "even": true }, doc! { "n": 6, "even": true }]
        );
    }

    #[test]
    fn count_emits_nothing_for_empty_input() {
        assert!(run(vec![], &[doc! { "$count": "count" }]).unwrap().is_empty());
        assert_eq!(
            run(numbers(3), &[doc! { "$count": "count" }]).unwrap(),
            vec![doc! { "count": 3 }]
        );
    }

    #[test]
    fn facet_runs_each_arm_over_the_same_input() {
        let output = run(
            numbers(5),
            &[doc! {
                "$facet": {
                    "data": [{ "$sort": { "n": -1 } }, { "$limit": 2 }, { "$project": { "n": 1 } }],
                    "total": [{ "$count": "count" }],
                }
            }],
        )
        .unwrap();

        assert_eq!(
            output,
            vec![doc! {
                "data": [{ "n": 5 }, { "n": 4 }],
                "total": [{ "count": 5 }],
            }]
        );
    }

    #[test]
    fn unsupported_stage_is_an_error() {
        assert!(run(numbers(1), &[doc! { "$lookup": {} }]).is_err());
        assert!(run(numbers(1), &[doc! { "$skip": 1, "$limit": 1 }]).is_err());
        assert!(run(numbers(1), &[doc! { "$limit": 0 }]).is_err());
    }
}
