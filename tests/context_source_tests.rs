mod common;

use common::{BucketResponse, MockObjectStore, TestFixtures};
use onprem_context::kubernetes::KubernetesYamlGenerator;
use onprem_context::{
    AppError, BucketStatus, ContextSource, ContextSourceConfig, OnPremContextSource,
};
use std::path::Path;
use std::sync::Arc;

// zlib CRC-32 of "123456789"
const CHECK_HASH: &str = "CBF43926";

fn source_with(store: Arc<MockObjectStore>, config: ContextSourceConfig) -> OnPremContextSource {
    OnPremContextSource::new(store, &config)
}

#[tokio::test]
async fn test_upload_context_derives_key_and_url_from_hash() {
    let store = Arc::new(MockObjectStore::new());
    let source = source_with(store.clone(), ContextSourceConfig::default());
    let archive = TestFixtures::context_archive(b"123456789");

    let uploaded = source.upload_context(archive.path()).await.unwrap();

    assert_eq!(uploaded.context_name, format!("{}.tar.gz", CHECK_HASH));
    assert_eq!(
        uploaded.url,
        format!("s3://fairing/fairing_builds/{}.tar.gz", CHECK_HASH)
    );

    let puts = store.puts().await;
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].bucket, "fairing");
    assert_eq!(puts[0].key, format!("fairing_builds/{}.tar.gz", CHECK_HASH));
    assert_eq!(puts[0].contents, b"123456789");
}

#[tokio::test]
async fn test_upload_succeeds_when_bucket_already_exists() {
    for status in [BucketStatus::AlreadyOwned, BucketStatus::AlreadyExists] {
        let store = Arc::new(MockObjectStore::new());
        store.set_bucket_response(BucketResponse::Status(status)).await;
        let source = source_with(store.clone(), ContextSourceConfig::default());
        let archive = TestFixtures::context_archive(b"context");

        let uploaded = source.upload_context(archive.path()).await;
        assert!(uploaded.is_ok(), "bucket status {status} should not fail upload");
        assert_eq!(store.puts().await.len(), 1);
    }
}

#[tokio::test]
async fn test_bucket_failure_stops_before_upload() {
    let store = Arc::new(MockObjectStore::new());
    store
        .set_bucket_response(BucketResponse::Error {
            code: "AccessDenied".to_string(),
            status: 403,
        })
        .await;
    let source = source_with(store.clone(), ContextSourceConfig::default());
    let archive = TestFixtures::context_archive(b"context");

    let err = source.upload_context(archive.path()).await.unwrap_err();

    assert_eq!(err.storage_code(), Some("AccessDenied"));
    assert!(store.puts().await.is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_propagated() {
    let store = Arc::new(MockObjectStore::new());
    store.fail_puts_with("InternalError").await;
    let mut source = source_with(store.clone(), ContextSourceConfig::default());
    let archive = TestFixtures::context_archive(b"context");

    let err = source.prepare(archive.path()).await.unwrap_err();

    assert_eq!(err.storage_code(), Some("InternalError"));
    assert_eq!(source.uploaded_context_url(), "");
    assert_eq!(source.context_name(), "build_context.tar.gz");
}

#[tokio::test]
async fn test_missing_archive_makes_no_store_calls() {
    let store = Arc::new(MockObjectStore::new());
    let mut source = source_with(store.clone(), ContextSourceConfig::default());

    let err = source
        .prepare(Path::new("/nonexistent/build_context.tar.gz"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ArchiveNotFound(_)));
    assert!(store.buckets_requested().await.is_empty());
    assert!(store.puts().await.is_empty());
}

#[tokio::test]
async fn test_prepare_uses_configured_bucket() {
    let store = Arc::new(MockObjectStore::new());
    let config = ContextSourceConfig {
        bucket: Some("ml-builds".to_string()),
        ..Default::default()
    };
    let mut source = source_with(store.clone(), config);
    let archive = TestFixtures::context_archive(b"123456789");

    let uploaded = source.prepare(archive.path()).await.unwrap();

    assert_eq!(store.buckets_requested().await, vec!["ml-builds"]);
    assert!(uploaded.url.starts_with("s3://ml-builds/fairing_builds/"));
    assert_eq!(source.uploaded_context_url(), uploaded.url);
}

#[tokio::test]
async fn test_prepared_pod_spec_references_uploaded_context() {
    let store = Arc::new(MockObjectStore::new());
    let config = ContextSourceConfig {
        registry_creds: Some("regcred".to_string()),
        ..Default::default()
    };
    let mut source = source_with(store, config);
    let archive = TestFixtures::context_archive(b"123456789");

    source.prepare(archive.path()).await.unwrap();
    let spec = source.generate_pod_spec("registry.local/model:v1", false);

    let fetcher = spec.init_container("minio-s3-pulling").unwrap();
    assert_eq!(
        fetcher.args[0],
        format!("s3://fairing/fairing_builds/{}.tar.gz", CHECK_HASH)
    );

    let kaniko = spec.container("kaniko").unwrap();
    assert_eq!(
        kaniko.args,
        vec![
            "--dockerfile=Dockerfile".to_string(),
            "--destination=registry.local/model:v1".to_string(),
            format!("--context=dir://build_context/{}.tar.gz", CHECK_HASH),
            "--no-push".to_string(),
        ]
    );

    let yaml = KubernetesYamlGenerator::generate_pod_spec_yaml(&spec).unwrap();
    assert!(yaml.contains("initContainers:"));
    assert!(yaml.contains("emptyDir: {}"));
    assert!(yaml.contains("key: .dockerconfigjson"));
    assert!(yaml.contains("path: .docker/config.json"));
    assert!(yaml.contains("name: regcred"));
}
