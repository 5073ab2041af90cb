//! Browse -> extract -> poll, end to end against an in-memory API.


use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use test_data_gen::{complete, running, FakeApi};
use vswir_client::{submit_extraction, Error, JobPoller, PagedFetcher, Pager};
use vswir_core::filter::parse_filters;
use vswir_core::job::JobState;
use vswir_core::view::{ViewCatalog, DEFAULT_VIEW};

fn plot_filter(names: &str) -> vswir_core::filter::FilterSet {
    let mut raw = BTreeMap::new();
    raw.insert("plot_name".to_string(), names.to_string());
    raw.insert("campaign_name".to_string(), String::new());
    parse_filters(&raw, None)
}

#[tokio::test]
async fn test_paging_through_a_view() {
    let api = FakeApi::new(10);
    let fetcher = PagedFetcher::new(Arc::clone(&api));
    let catalog = ViewCatalog::builtin();
    let view = catalog.get(DEFAULT_VIEW).unwrap();
    let filters = parse_filters(&BTreeMap::new(), None);
    let mut pager = Pager::new(4);

    let first = pager.apply(&fetcher, view, &filters).await.unwrap().unwrap();
    assert_eq!(first.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert_eq!(first.geojson.as_ref().unwrap().len(), 4);

    let second = pager.next(&fetcher, view, &filters).await.unwrap().unwrap();
    assert_eq!(second.rows[0].id, 4);
    // Plot 4 has no geometry and is left out of the overlay.
    assert_eq!(second.geojson.as_ref().unwrap().len(), 3);

    let third = pager.next(&fetcher, view, &filters).await.unwrap().unwrap();
    assert_eq!(third.len(), 2);
    assert!(pager.has_more());

    let last = pager.next(&fetcher, view, &filters).await.unwrap().unwrap();
    assert!(last.is_empty());
    assert!(!pager.has_more());

    let queries = api.queries.lock().unwrap();
    assert_eq!(queries.len(), 4);
    assert_eq!(queries[1].offset, Some(4));
    assert_eq!(queries[1].limit, Some(4));
    assert_eq!(queries[0].select.as_ref(), Some(&view.select_columns));
    assert!(queries[0].filters.is_none());
}

#[tokio::test]
async fn test_rows_are_numbered_from_the_page_offset() {
    let api = FakeApi::new(50);
    let fetcher = PagedFetcher::new(Arc::clone(&api));
    let catalog = ViewCatalog::builtin();
    let view = catalog.get(DEFAULT_VIEW).unwrap();
    let mut pager = Pager::new(5);

    let req = pager.begin_at(40);
    let page = pager
        .run(&fetcher, req, view, &parse_filters(&BTreeMap::new(), None))
        .await
        .unwrap()
        .unwrap();
    let row = &page.rows[2];
    assert_eq!(row.id, 42);
    assert_eq!(row.get("plot_id"), Some(&json!(42)));
    assert_eq!(row.geom.as_ref().unwrap().kind(), "Point");
    assert!(!row.table_columns().contains(&"geom"));
    assert_eq!(pager.offset(), 40);
}

#[tokio::test(start_paused = true)]
async fn test_extract_and_poll_to_completion() {
    let api = FakeApi::new(8);
    let fetcher = PagedFetcher::new(Arc::clone(&api));
    let catalog = ViewCatalog::builtin();
    let view = catalog.get(DEFAULT_VIEW).unwrap();

    let job = submit_extraction(&fetcher, view, &plot_filter("001-ER18, 003-ER18"))
        .await
        .unwrap();
    assert_eq!(job.pixel_count, 6);
    assert_eq!(
        serde_json::to_value(&job.ranges).unwrap(),
        json!([[10, 12], [30, 32]])
    );

    // The unpaged fetch sends the filters but no limit.
    {
        let queries = api.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].limit, None);
        let body = serde_json::to_value(&queries[0]).unwrap();
        assert_eq!(body["filters"], json!({"plot_name": ["001-ER18", "003-ER18"]}));
    }
    {
        let submitted = api.submitted.lock().unwrap();
        let body = serde_json::to_value(&submitted[0]).unwrap();
        assert_eq!(
            body,
            json!({
                "view": "extracted_spectra_view",
                "format": "parquet",
                "filters": {"pixel_id": [[10, 12], [30, 32]]},
                "debug": true
            })
        );
    }

    api.script_statuses(vec![
        Err(Error::NotFound("job_status/job-42".into())),
        running(10),
        complete(50, "https://example.org/result.parquet"),
    ]);
    let mut poller = JobPoller::new(Arc::clone(&api), Duration::from_secs(2));
    poller.activate(job.job_id.clone());
    let done = poller.wait_for_terminal().await;

    assert_eq!(done.state, Some(JobState::Complete));
    assert_eq!(done.rows_processed, 50);
    assert_eq!(
        done.download_url.as_deref(),
        Some("https://example.org/result.parquet")
    );
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_polling_error_is_terminal() {
    let api = FakeApi::new(1);
    api.script_statuses(vec![
        running(5),
        Err(Error::Transport("connection reset".into())),
    ]);
    let mut poller = JobPoller::new(Arc::clone(&api), Duration::from_secs(2));
    poller.activate("job-42".into());

    let p = poller.wait_for_terminal().await;
    assert_eq!(p.rows_processed, 5);
    assert!(p.error.as_deref().unwrap().contains("connection reset"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.status_calls(), 2);
}

#[tokio::test]
async fn test_extraction_without_matches_submits_nothing() {
    let api = FakeApi::new(3);
    let fetcher = PagedFetcher::new(Arc::clone(&api));
    let catalog = ViewCatalog::builtin();
    let view = catalog.get(DEFAULT_VIEW).unwrap();

    let err = submit_extraction(&fetcher, view, &plot_filter("999-ER18"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoPixelIds));
    assert!(api.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_trait_view_cannot_be_extracted() {
    let api = FakeApi::new(3);
    let fetcher = PagedFetcher::new(Arc::clone(&api));
    let catalog = ViewCatalog::builtin();
    let view = catalog.get("insitu_sample_trait_mv").unwrap();

    let err = submit_extraction(&fetcher, view, &plot_filter("001-ER18"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotExtractable(_)));
    assert!(api.queries.lock().unwrap().is_empty());
}
