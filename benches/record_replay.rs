//! Benchmarks for record-playback performance

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use http_recorder::config::{Config, Mode};
use http_recorder::network::{HttpRequest, HttpResponse, Transport};
use http_recorder::proxy::HttpRecorder;
use http_recorder::recording::{RecordEntry, Session};

struct StaticTransport;

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, request: HttpRequest) -> http_recorder::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: Default::default(),
            body: request.uri.into_bytes(),
        })
    }
}

fn create_test_config(mode: Mode, dir: &TempDir) -> Config {
    Config {
        mode,
        recording_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

async fn record_requests(dir: &TempDir, count: usize) {
    let session = Arc::new(Session::open(create_test_config(Mode::Record, dir)).unwrap());
    let recorder = HttpRecorder::new(Arc::clone(&session), StaticTransport);

    for i in 0..count {
        recorder
            .send(HttpRequest::new("GET", format!("/api/test/{i}")))
            .await
            .unwrap();
    }

    session.close().await.unwrap();
}

fn bench_record_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("record_100_requests", |b| {
        b.iter(|| {
            rt.block_on(async {
                let temp_dir = TempDir::new().unwrap();
                record_requests(&temp_dir, 100).await;
            });
        });
    });
}

fn bench_playback_load(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let temp_dir = TempDir::new().unwrap();
    rt.block_on(record_requests(&temp_dir, 100));

    c.bench_function("playback_open_100_requests", |b| {
        b.iter(|| {
            let session =
                Session::open(black_box(create_test_config(Mode::Playback, &temp_dir))).unwrap();
            black_box(session.stats());
        });
    });
}

fn bench_playback_single_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let temp_dir = TempDir::new().unwrap();
    rt.block_on(record_requests(&temp_dir, 0));

    let session = Arc::new(Session::open(create_test_config(Mode::Playback, &temp_dir)).unwrap());
    let player = HttpRecorder::new(Arc::clone(&session), StaticTransport);
    let entry = RecordEntry {
        request_method: "GET".to_string(),
        request_uri: "/api/test".to_string(),
        response_body: "ok".to_string(),
        status_code: 200,
        ..RecordEntry::default()
    };

    c.bench_function("playback_single_request", |b| {
        b.iter(|| {
            player.inject_record_entry(entry.clone()).unwrap();
            let response = rt
                .block_on(player.send(black_box(HttpRequest::new("GET", "/api/test"))))
                .unwrap();
            black_box(response);
        });
    });
}

criterion_group!(
    benches,
    bench_record_batch,
    bench_playback_load,
    bench_playback_single_request
);
criterion_main!(benches);
