use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use weather_archive::validate_daily;

fn year_body() -> Value {
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let time: Vec<String> = start.iter_days().take(365).map(|d| d.to_string()).collect();
    let values: Vec<f64> = (0..365).map(|i| (i as f64 / 10.0).sin() * 12.0).collect();
    json!({
        "daily": {
            "time": time,
            "temperature_2m_max": values,
            "temperature_2m_min": values,
            "temperature_2m_mean": values,
            "apparent_temperature_max": values,
            "apparent_temperature_min": values,
            "apparent_temperature_mean": values
        }
    })
}

fn bench_validation(c: &mut Criterion) {
    let body = year_body();
    let raw = body.to_string();
    c.bench_function("validate_daily_365", |b| {
        b.iter(|| validate_daily(black_box(&body)))
    });
    c.bench_function("parse_and_validate_365", |b| {
        b.iter(|| {
            let value: Value = serde_json::from_str(black_box(&raw)).unwrap();
            validate_daily(&value)
        })
    });
}

criterion_group!(benches, bench_validation);
criterion_main!(benches);
