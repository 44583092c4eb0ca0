//! Shared test utilities: an in-process S3-compatible endpoint.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use url::Url;

use store::BucketConfig;

pub const BUCKET: &str = "studies";

/// Bucket contents, key-sorted like the real service's listings.
pub type Objects = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

#[derive(Clone)]
struct BucketState {
    objects: Objects,
    truncated: Arc<AtomicBool>,
}

pub struct FakeS3 {
    pub addr: SocketAddr,
    pub objects: Objects,
    truncated: Arc<AtomicBool>,
}

impl FakeS3 {
    /// Client configuration pointed at this endpoint.
    pub fn config(&self) -> BucketConfig {
        BucketConfig {
            endpoint: Some(Url::parse(&format!("http://{}", self.addr)).unwrap()),
            region: Some("us-east-1".to_string()),
            signing_region: None,
            bucket: BUCKET.to_string(),
            access_key_id: "test-access-key".to_string(),
            secret_key: "test-secret-key".to_string(),
            force_path_style: true,
        }
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Make every listing claim there are more pages.
    pub fn set_truncated(&self, truncated: bool) {
        self.truncated.store(truncated, Ordering::SeqCst);
    }
}

/// Start a fake endpoint on an ephemeral port, pre-seeded with objects.
pub async fn spawn(seed: &[(&str, &[u8])]) -> FakeS3 {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let objects: Objects = Arc::new(Mutex::new(
        seed.iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect(),
    ));
    let truncated = Arc::new(AtomicBool::new(false));
    let state = BucketState {
        objects: objects.clone(),
        truncated: truncated.clone(),
    };

    let app = Router::new()
        .route("/:bucket", get(list_objects))
        .route("/:bucket/*key", get(get_object).put(put_object))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeS3 {
        addr,
        objects,
        truncated,
    }
}

fn xml_response(status: StatusCode, body: String) -> Response {
    (status, [("content-type", "application/xml")], body).into_response()
}

async fn list_objects(
    State(state): State<BucketState>,
    Path(_bucket): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let prefix = params.get("prefix").cloned().unwrap_or_default();
    let truncated = state.truncated.load(Ordering::SeqCst);
    let objects = state.objects.lock().unwrap();

    let mut body = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">"#,
    ));
    body.push_str(&format!("<Name>{}</Name>", BUCKET));
    if truncated {
        body.push_str("<IsTruncated>true</IsTruncated>");
        body.push_str("<NextMarker>next-page</NextMarker>");
    } else {
        body.push_str("<IsTruncated>false</IsTruncated>");
    }
    for (key, data) in objects.iter().filter(|(k, _)| k.starts_with(&prefix)) {
        body.push_str(&format!(
            "<Contents><Key>{}</Key><Size>{}</Size><LastModified>2020-10-04T00:16:00.000Z</LastModified></Contents>",
            key,
            data.len()
        ));
    }
    body.push_str("</ListBucketResult>");
    xml_response(StatusCode::OK, body)
}

async fn get_object(
    State(state): State<BucketState>,
    Path((_bucket, key)): Path<(String, String)>,
) -> Response {
    match state.objects.lock().unwrap().get(&key) {
        Some(data) => (StatusCode::OK, data.clone()).into_response(),
        None => xml_response(
            StatusCode::NOT_FOUND,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "<Error><Code>NoSuchKey</Code>",
                "<Message>The specified key does not exist.</Message></Error>",
            )
            .to_string(),
        ),
    }
}

async fn put_object(
    State(state): State<BucketState>,
    Path((_bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    state.objects.lock().unwrap().insert(key, body.to_vec());
    StatusCode::OK.into_response()
}

/// Configuration marker for the study with one result archive.
pub const INTRO_CONFIG: &str = r#"{
  "title": "Intro-1: ZI Agent, vary number of buyers",
  "periods": 100,
  "common": {
    "buyerRate": [0.2],
    "sellerRate": [0.2],
    "periodDuration": 1000
  },
  "configurations": [
    {"numberOfBuyers": 2, "numberOfSellers": 5},
    {"numberOfBuyers": 5, "numberOfSellers": 5},
    {"numberOfBuyers": 10, "numberOfSellers": 5}
  ]
}"#;

/// Configuration marker for the study without archives.
pub const NO_ZIPS_CONFIG: &str = r#"{"title": "no-zips-yet", "periods": 10, "configurations": []}"#;

/// Stand-in result archive (only the magic bytes matter here).
pub const ZIP_BYTES: &[u8] = b"PK\x03\x04studydb-fake-archive-payload-0123456789";
