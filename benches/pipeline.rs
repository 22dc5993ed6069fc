use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use leadhook::{RequestContext, WebhookPipeline, detect_webhook_type};
use serde_json::{Value, json};
use std::hint::black_box;

fn facebook_envelope(leads: usize) -> Value {
    let changes: Vec<Value> = (0..leads)
        .map(|i| {
            json!({
                "field": "leadgen",
                "value": {
                    "leadgen_id": format!("lg-{i}"),
                    "campaign_id": "c-1",
                    "field_data": [
                        {"name": "full_name", "values": [format!("Lead {i}")]},
                        {"name": "email", "values": [format!("lead{i}@example.com")]},
                        {"name": "budget", "values": ["$12,000"]},
                        {"name": "city", "values": ["Austin"]}
                    ]
                }
            })
        })
        .collect();
    json!({"object": "page", "entry": [{"id": "page-1", "changes": changes}]})
}

fn generic_batch(leads: usize) -> Value {
    let items: Vec<Value> = (0..leads)
        .map(|i| {
            json!({
                "Full Name": format!("Lead {i}"),
                "E-Mail": format!("lead{i}@example.com"),
                "Phone Number": "+1 555 0100",
                "Deal Value": "4500",
                "Lead Source": "referral",
                "utm_campaign": "spring"
            })
        })
        .collect();
    Value::Array(items)
}

fn swipepages_submission() -> Value {
    json!({
        "first_name": "Ann",
        "last_name": "Lee",
        "email": "ANN@example.com",
        "budget": "10k-25k",
        "utm_source": "google",
        "utm_campaign": "Spring Sale",
        "form_name": "Contact Us",
        "message": "Call me",
        "comments": "After 5pm",
        "zipcode": "73301"
    })
}

/// Benchmark batch normalization at different sizes
fn bench_batch_sizes(c: &mut Criterion) {
    let pipeline = WebhookPipeline::new();
    let ctx = RequestContext::new();
    let mut group = c.benchmark_group("batch_sizes");

    for size in [1, 10, 100, 1000] {
        let facebook = facebook_envelope(size);
        let generic = generic_batch(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("facebook_{size}"), |b| {
            b.iter(|| {
                pipeline
                    .process_webhook("facebook", black_box(&facebook), &ctx)
                    .expect("facebook payload should normalize")
            });
        });
        group.bench_function(format!("generic_{size}"), |b| {
            b.iter(|| {
                pipeline
                    .process_webhook("generic", black_box(&generic), &ctx)
                    .expect("generic payload should normalize")
            });
        });
    }

    group.finish();
}

fn bench_single_submission(c: &mut Criterion) {
    let pipeline = WebhookPipeline::new();
    let ctx = RequestContext::new().with_header("Referer", "https://partner.example");
    let raw = swipepages_submission();

    c.bench_function("swipepages_single", |b| {
        b.iter(|| {
            pipeline
                .process_webhook("swipepages", black_box(&raw), &ctx)
                .expect("swipepages payload should normalize")
        });
    });
}

fn bench_detection(c: &mut Criterion) {
    let ctx = RequestContext::new().with_header("X-Zapier-Hook-Id", "h-1");
    let raw = swipepages_submission();

    c.bench_function("detect_webhook_type", |b| {
        b.iter(|| detect_webhook_type(black_box(&ctx), black_box(&raw)));
    });
}

criterion_group!(
    benches,
    bench_batch_sizes,
    bench_single_submission,
    bench_detection
);
criterion_main!(benches);
