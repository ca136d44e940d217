//! The in-memory and `SQLite` pushdown backends must agree on every query.

use std::sync::Arc;

use book_analytics_core::{
    Book, BookFilter, BookQuery, BookStore, Catalog, CorpusCache, DEFAULT_LOAD_TIMEOUT, Database,
    MemoryStore, RawRecord, SortKey, SqliteBookStore, StoreCorpusSource, normalize_record,
};
use serde_json::json;

fn raw_records() -> Vec<RawRecord> {
    serde_json::from_value(json!([
        {"id": "1", "title": "The Cat", "price": "£10.00", "availability": "In stock"},
        {"id": "2", "title": "dog days", "price": "£25.50", "availability": "In Stock"},
        {"id": "3", "title": "Bird Box", "price": "£40.00", "availability": "Out of stock"},
        {"id": "4", "title": "Another Cat Tale", "price": null, "availability": " in stock "},
        {"url": "http://books.example/cat-2", "title": "CAT", "price": "£10.00"},
        {"_id": {"$oid": "65a1"}, "title": "Élan Vital", "price": "$1,234.56", "availability": "Preorder"},
        {"title": "", "price": "call for price", "availability": ""},
        {"id": "8", "title": "Cats & Dogs!!!", "price_num": 25.5, "price": "£99.00", "availability": "Out of stock"},
        {"id": "9", "title": "Zebra", "price": 0, "availability": "In stock"},
        {"id": "10", "title": "catalogue raisonné", "price": "£39.99", "availability": "In stock"}
    ]))
    .unwrap()
}

async fn sqlite_store(records: &[RawRecord]) -> SqliteBookStore {
    let store = SqliteBookStore::new(Database::new_in_memory().await.unwrap());
    store.import(records).await.unwrap();
    store
}

fn memory_store(records: &[RawRecord]) -> MemoryStore {
    MemoryStore::from(records.iter().map(normalize_record).collect::<Vec<Book>>())
}

fn filters() -> Vec<BookFilter> {
    vec![
        BookFilter::default(),
        BookFilter {
            title_contains: Some("cat".to_string()),
            ..BookFilter::default()
        },
        BookFilter {
            availability: Some("in stock".to_string()),
            ..BookFilter::default()
        },
        BookFilter {
            price_min: Some(10.0),
            ..BookFilter::default()
        },
        BookFilter {
            price_max: Some(25.5),
            ..BookFilter::default()
        },
        BookFilter {
            title_contains: Some("é".to_string()),
            ..BookFilter::default()
        },
        BookFilter {
            title_contains: Some("cat".to_string()),
            availability: Some("in stock".to_string()),
            price_min: Some(5.0),
            price_max: Some(40.0),
        },
    ]
}

const SORTS: [Option<SortKey>; 5] = [
    None,
    Some(SortKey::PriceAsc),
    Some(SortKey::PriceDesc),
    Some(SortKey::TitleAsc),
    Some(SortKey::TitleDesc),
];

const PAGES: [(usize, usize); 4] = [(0, 100), (0, 3), (2, 2), (50, 10)];

#[tokio::test]
async fn test_count_and_find_agree_across_backends() {
    let records = raw_records();
    let memory = memory_store(&records);
    let sqlite = sqlite_store(&records).await;

    for filter in filters() {
        assert_eq!(
            memory.count(&filter).await.unwrap(),
            sqlite.count(&filter).await.unwrap(),
            "count mismatch for {filter:?}"
        );

        for sort in SORTS {
            for (offset, limit) in PAGES {
                let expected = memory.find(&filter, sort, offset, limit).await.unwrap();
                let actual = sqlite.find(&filter, sort, offset, limit).await.unwrap();
                assert_eq!(
                    expected, actual,
                    "find mismatch for {filter:?} sort={sort:?} offset={offset} limit={limit}"
                );
            }
        }
    }
}

#[tokio::test]
async fn test_fetch_all_matches_normalized_records() {
    let records = raw_records();
    let sqlite = sqlite_store(&records).await;

    let stored = sqlite.fetch_all().await.unwrap();
    let expected: Vec<Book> = records.iter().map(normalize_record).collect();

    assert_eq!(stored, expected);
    assert_eq!(stored[4].id, "http://books.example/cat-2");
    assert_eq!(stored[5].id, "65a1");
    assert_eq!(stored[6].id, "");
}

/// Two catalogs over one store: one reads the snapshot, one pushes down.
async fn catalogs() -> (Catalog, Catalog) {
    let store = sqlite_store(&raw_records()).await;
    let corpus = || {
        Arc::new(CorpusCache::new(
            Arc::new(StoreCorpusSource::new(store.clone(), "sqlite:memory")),
            DEFAULT_LOAD_TIMEOUT,
        ))
    };
    let memory = Catalog::in_memory(corpus());
    let pushdown = Catalog::pushdown(corpus(), store.clone());
    (memory, pushdown)
}

#[tokio::test]
async fn test_list_books_agrees_across_catalog_backends() {
    let (memory, pushdown) = catalogs().await;

    for sort in SORTS {
        for (offset, limit) in PAGES {
            let query = BookQuery {
                text_query: Some("CAT".to_string()),
                sort,
                offset,
                limit,
                ..BookQuery::default()
            };
            assert_eq!(
                memory.list_books(&query).await.unwrap(),
                pushdown.list_books(&query).await.unwrap(),
                "page mismatch for {query:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_aggregates_agree_across_catalog_backends() {
    let (memory, pushdown) = catalogs().await;

    assert_eq!(
        memory.availability_distribution().await.unwrap(),
        pushdown.availability_distribution().await.unwrap()
    );

    let expected = memory.price_stats().await.unwrap();
    let actual = pushdown.price_stats().await.unwrap();
    assert_eq!(expected.count, actual.count);
    assert_eq!(expected.min, actual.min);
    assert_eq!(expected.max, actual.max);
    let (expected_avg, actual_avg) = (expected.average.unwrap(), actual.average.unwrap());
    assert!((expected_avg - actual_avg).abs() < 1e-9);

    for bucket_size in [0.5, 5.0, 10.0, 250.0, 5000.0] {
        assert_eq!(
            memory.price_buckets(bucket_size).await.unwrap(),
            pushdown.price_buckets(bucket_size).await.unwrap(),
            "histogram mismatch for bucket_size={bucket_size}"
        );
    }

    assert_eq!(
        memory.title_words(5).await.unwrap(),
        pushdown.title_words(5).await.unwrap()
    );
}

#[tokio::test]
async fn test_invalid_parameters_rejected_by_both_backends() {
    let (memory, pushdown) = catalogs().await;
    let query = BookQuery {
        limit: 0,
        ..BookQuery::default()
    };

    assert!(memory.list_books(&query).await.unwrap_err().is_invalid_parameter());
    assert!(pushdown.list_books(&query).await.unwrap_err().is_invalid_parameter());
    assert!(pushdown.price_buckets(-1.0).await.unwrap_err().is_invalid_parameter());
}
