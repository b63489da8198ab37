use axum::{Router, http::StatusCode, routing::get};
use catalog_lookup::engine::{CatalogLoader, CatalogSource, LookupSession};
use catalog_lookup::error::LookupError;
use catalog_lookup::record::{SortField, SortSpec};
use catalog_lookup::view::LookupView;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const CATALOG: &str = "Item,Description,List\n\
    ST-320,Stonehenge 320gsm white,12.50\n\
    MOAB-250,\"Moab Entrada Rag, 250gsm\",42\n\
    ENV-10,Envelope #10 bond,0.35\n\
    ,orphan row,1.00\n";

struct MockFeed {
    url: String,
    hits: Arc<AtomicUsize>,
    server: JoinHandle<()>,
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// Serves the catalog; the first `failures` requests get a 500
async fn mock_feed(failures: usize, delay: Duration, status: StatusCode) -> MockFeed {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().route(
        "/catalog.csv",
        get(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                if n < failures {
                    (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                } else {
                    (status, CATALOG.to_string())
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    MockFeed {
        url: format!("http://{}/catalog.csv", addr),
        hits,
        server,
    }
}

fn remote(feed: &MockFeed) -> CatalogLoader {
    CatalogLoader::new(CatalogSource::Remote(feed.url.clone()))
}

#[tokio::test]
async fn loads_once_and_reuses_catalog() {
    let feed = mock_feed(0, Duration::ZERO, StatusCode::OK).await;
    let loader = remote(&feed);

    let first = loader.load().await.expect("first load");
    assert_eq!(first.len(), 3);
    assert_eq!(first.records[1].description, "Moab Entrada Rag, 250gsm");

    let second = loader.load().await.expect("second load");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);
    assert!(loader.status().loaded_at.is_some());
}

#[tokio::test]
async fn concurrent_triggers_share_one_request() {
    let feed = mock_feed(0, Duration::from_millis(150), StatusCode::OK).await;
    let loader = remote(&feed);

    let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn loading_flag_is_visible_while_in_flight() {
    let feed = mock_feed(0, Duration::from_millis(300), StatusCode::OK).await;
    let loader = Arc::new(remote(&feed));
    let session = LookupSession::with_state("bond", SortSpec::default());

    let pending = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.load().await.map(|c| c.len()) })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(loader.is_loading());
    assert_eq!(session.view(&loader), LookupView::Loading);

    assert_eq!(pending.await.unwrap().unwrap(), 3);
    assert!(!loader.is_loading());
    assert_eq!(session.view(&loader).items().len(), 1);
}

#[tokio::test]
async fn concurrent_loads_share_one_failure() {
    let feed = mock_feed(usize::MAX, Duration::from_millis(150), StatusCode::OK).await;
    let loader = remote(&feed);

    let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());
    let (a, b, c) = (a.unwrap_err(), b.unwrap_err(), c.unwrap_err());

    // every waiter sees the same failed attempt
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);
    assert!(!loader.is_loading());

    // only a separate call after the failure fetches again
    assert!(loader.load().await.is_err());
    assert_eq!(feed.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn search_returns_loading_without_waiting() {
    let feed = mock_feed(0, Duration::from_millis(300), StatusCode::OK).await;
    let loader = remote(&feed);
    let mut session = LookupSession::new();

    let view = tokio::time::timeout(Duration::from_millis(100), async {
        session.search(&loader, "bond")
    })
    .await
    .expect("search returned before the feed answered");
    assert_eq!(view, LookupView::Loading);
    assert!(loader.is_loading());

    // a second search while loading joins the same fetch
    assert_eq!(session.search(&loader, "gsm"), LookupView::Loading);

    loader.settled().await;
    assert!(!loader.is_loading());
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);
    assert_eq!(session.view(&loader).items().len(), 2);
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let feed = mock_feed(0, Duration::ZERO, StatusCode::NOT_FOUND).await;
    let loader = remote(&feed);

    match loader.load().await.map(|c| c.len()) {
        Err(e) => match e.as_ref() {
            LookupError::Fetch(message) => assert!(message.contains("404")),
            other => panic!("expected fetch error, got {:?}", other),
        },
        Ok(n) => panic!("expected fetch error, got {} records", n),
    }

    assert!(loader.catalog().is_none());
    let status = loader.status();
    assert!(!status.loaded);
    assert_eq!(status.records, 0);

    // a new query tries again and lands on the error view once it settles
    let mut session = LookupSession::new();
    assert_eq!(session.search(&loader, "bond"), LookupView::Loading);
    loader.settled().await;
    assert_eq!(feed.hits.load(Ordering::SeqCst), 2);
    match session.view(&loader) {
        LookupView::Error { message } => {
            assert!(message.starts_with("Failed to load product data:"));
        }
        other => panic!("expected error view, got {:?}", other),
    }
    assert!(view_items_empty(&session, &loader));
}

fn view_items_empty(session: &LookupSession, loader: &CatalogLoader) -> bool {
    session.view(loader).items().is_empty()
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let feed = mock_feed(1, Duration::ZERO, StatusCode::OK).await;
    let loader = remote(&feed);

    assert!(loader.load().await.is_err());
    assert!(loader.error().is_some());

    let catalog = loader.load().await.expect("retry succeeds");
    assert_eq!(catalog.len(), 3);
    assert!(loader.error().is_none());
    assert_eq!(feed.hits.load(Ordering::SeqCst), 2);

    // loaded now, further loads are no-ops
    loader.load().await.unwrap();
    assert_eq!(feed.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn blank_queries_do_not_trigger_a_fetch() {
    let feed = mock_feed(0, Duration::ZERO, StatusCode::OK).await;
    let loader = remote(&feed);
    let mut session = LookupSession::new();

    assert_eq!(session.search(&loader, "   "), LookupView::NoQuery);
    assert!(!loader.is_loading());
    assert_eq!(feed.hits.load(Ordering::SeqCst), 0);

    session.search(&loader, "GSM");
    loader.settled().await;
    assert_eq!(session.view(&loader).name(), "results");
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);

    session.toggle_sort(SortField::Price);
    session.toggle_sort(SortField::Price);
    let codes: Vec<String> = session
        .view(&loader)
        .items()
        .iter()
        .map(|r| r.code.clone())
        .collect();
    assert_eq!(codes, vec!["MOAB-250", "ST-320"]);

    let view = session.search(&loader, "no such thing");
    assert_eq!(view.name(), "no-results");
    assert_eq!(feed.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_feed_is_a_fetch_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let loader = CatalogLoader::new(CatalogSource::Remote(format!("http://{}/gone.csv", addr)));
    let err = loader.load().await.unwrap_err();
    assert!(matches!(*err, LookupError::Fetch(_)));
}

#[tokio::test]
async fn local_file_source_uses_the_same_parser() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let loader = CatalogLoader::new(CatalogSource::parse(file.path().to_str().unwrap()));
    let catalog = loader.load().await.unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.records[2].price, 0.35);
}

#[tokio::test]
async fn missing_local_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CatalogLoader::new(CatalogSource::File(dir.path().join("absent.csv")));

    let err = loader.load().await.unwrap_err();
    assert!(matches!(*err, LookupError::Io(_)));
    assert!(loader.error().is_some());
}

#[tokio::test]
async fn short_payload_is_a_format_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"code,description,price\n").unwrap();

    let loader = CatalogLoader::new(CatalogSource::File(file.path().to_path_buf()));
    let err = loader.load().await.unwrap_err();
    assert!(matches!(*err, LookupError::Format(_)));
    assert!(loader.catalog().is_none());
}
