use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heatpump::{
    annotate, threshold_table, DailyTemperaturePoint, LatLon, RollingWindow, TemperatureSeries,
    TemperatureUnit,
};

/// Four years of synthetic daily minimums with a seasonal swing.
fn four_years() -> TemperatureSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let points = (0..1461)
        .map(|d| {
            let season = (d as f64 / 365.25 * std::f64::consts::TAU).cos();
            DailyTemperaturePoint::new(start + Duration::days(d), 35.0 - 30.0 * season)
        })
        .collect();
    TemperatureSeries::new(LatLon(40.12, -88.26), TemperatureUnit::Fahrenheit, points)
}

fn bench_analysis(c: &mut Criterion) {
    let series = four_years();
    c.bench_function("annotate_weekly_monthly", |b| {
        b.iter(|| {
            annotate(
                black_box(&series),
                black_box(5.0),
                &[RollingWindow::Weekly, RollingWindow::Monthly],
            )
        })
    });
    c.bench_function("threshold_table_full_range", |b| {
        b.iter(|| threshold_table(black_box(&series), black_box(-25), black_box(60)))
    });
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
