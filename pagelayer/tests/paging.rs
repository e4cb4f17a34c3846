use bson::{DateTime, Document, doc};
use pagelayer::{memory::InMemoryBackend, prelude::*};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    n: i32,
}

async fn store_with_items(count: i32) -> PagingStore<InMemoryBackend> {
    let items = (1..=count)
        .map(|n| {
            let kind = if n % 5 == 0 { "special" } else { "plain" };

            doc! {
                "n": n,
                "kind": kind,
                "createdAt": DateTime::from_millis(1_700_000_000_000 + i64::from(n) * 1_000),
            }
        })
        .collect::<Vec<Document>>();

    PagingStore::new(
        InMemoryBackend::builder()
            .with_documents("items", items)
            .build()
            .await
            .unwrap(),
    )
}

fn numbers(page: &Page) -> Vec<i32> {
    page.data
        .iter()
        .map(|document| document.get_i32("n").unwrap())
        .collect()
}

#[tokio::test]
async fn find_returns_second_page_of_twenty_five() {
    let store = store_with_items(25).await;

    let page = store
        .collection("items")
        .paging()
        .limit(10)
        .page(2)
        .filter(doc! {})
        .find()
        .await
        .unwrap();

    assert_eq!(numbers(&page), (11..=20).collect::<Vec<_>>());
    assert_eq!(
        page.pagination,
        PaginationMetadata {
            total: 25,
            page: 2,
            limit: 10,
            total_pages: 3,
            has_previous: true,
            has_next: true,
            previous_page: Some(1),
            next_page: Some(3),
        }
    );
}

#[tokio::test]
async fn find_applies_filter_sort_and_projection() {
    let store = store_with_items(25).await;

    let page = store
        .collection("items")
        .paging()
        .filter(doc! { "kind": "special" })
        .select(doc! { "n": 1 })
        .sort("n", SortDirection::Desc)
        .limit(2)
        .page(1)
        .find()
        .await
        .unwrap();

    assert_eq!(page.data, vec![doc! { "n": 25 }, doc! { "n": 20 }]);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
}

#[tokio::test]
async fn find_coerces_invalid_page_and_limit() {
    let store = store_with_items(25).await;

    let page = store
        .collection("items")
        .paging()
        .filter(doc! {})
        .limit(0)
        .page(-1)
        .find()
        .await
        .unwrap();

    assert_eq!(page.len(), 10);
    assert_eq!(page.pagination.page, 1);
    assert_eq!(page.pagination.limit, 10);
    assert!(!page.pagination.has_previous);
}

#[tokio::test]
async fn aggregate_pages_newest_first() {
    let store = store_with_items(25).await;

    let page = store
        .collection("items")
        .paging()
        .limit(10)
        .page(1)
        .aggregate(vec![doc! { "$match": { "kind": "plain" } }])
        .await
        .unwrap();

    assert_eq!(numbers(&page), vec![24, 23, 22, 21, 19, 18, 17, 16, 14, 13]);
    assert_eq!(page.pagination.total, 20);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next);
}

#[tokio::test]
async fn aggregate_past_the_last_page_reports_zero_total() {
    let store = store_with_items(25).await;

    let page = store
        .collection("items")
        .paging()
        .limit(10)
        .page(4)
        .aggregate(vec![])
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.pagination.total, 0);
    assert_eq!(page.pagination.total_pages, 0);
}

#[tokio::test]
async fn aggregate_rejects_builder_filter() {
    let store = store_with_items(3).await;

    let result = store
        .collection("items")
        .paging()
        .filter(doc! {})
        .limit(10)
        .page(1)
        .aggregate(vec![])
        .await;

    assert!(matches!(result, Err(PagingError::FilterInAggregate)));
}

#[tokio::test]
async fn unsupported_stage_surfaces_backend_error() {
    let store = store_with_items(3).await;

    let result = store
        .collection("items")
        .paging()
        .limit(10)
        .page(1)
        .aggregate(vec![doc! { "$lookup": { "from": "other" } }])
        .await;

    assert!(matches!(result, Err(PagingError::Backend(_))));
}

#[tokio::test]
async fn page_decodes_and_renders_as_json() {
    let store = store_with_items(3).await;

    let page = store
        .collection("items")
        .paging()
        .filter(doc! {})
        .select(doc! { "n": 1 })
        .limit(2)
        .page(2)
        .find()
        .await
        .unwrap();

    assert_eq!(
        page.clone().into_json().unwrap(),
        json!({
            "data": [{ "n": 3 }],
            "pagination": {
                "total": 3,
                "page": 2,
                "limit": 2,
                "totalPages": 2,
                "hasPrevious": true,
                "hasNext": false,
                "prev": 1,
            },
        })
    );

    let typed: Page<Item> = page.decode().unwrap();
    assert_eq!(typed.data, vec![Item { n: 3 }]);

    store.shutdown().await.unwrap();
}
