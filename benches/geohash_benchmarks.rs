use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatio_geohash::{
    BoundingBox, GeohashIndex, MemoryStore, Precision, bounding_boxes, decode, encode,
    encode_many, neighbors, runs,
};
use std::sync::Arc;

fn sample_points(n: usize) -> (Vec<f64>, Vec<f64>) {
    let lons = (0..n).map(|i| -180.0 + (i as f64 * 7.31) % 360.0).collect();
    let lats = (0..n).map(|i| -90.0 + (i as f64 * 3.17) % 180.0).collect();
    (lons, lats)
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for p in [3, 6, 12] {
        let precision = Precision::new(p).unwrap();
        group.bench_with_input(BenchmarkId::new("encode", p), &precision, |b, &precision| {
            b.iter(|| encode(black_box(2.349), black_box(48.864), precision).unwrap())
        });

        let code = encode(2.349, 48.864, precision).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", p), &code, |b, code| {
            b.iter(|| decode(black_box(code)))
        });
        group.bench_with_input(BenchmarkId::new("neighbors", p), &code, |b, code| {
            b.iter(|| neighbors(black_box(code)))
        });
    }

    let (lons, lats) = sample_points(10_000);
    let precision = Precision::new(6).unwrap();
    group.bench_function("encode_many_10k", |b| {
        b.iter(|| encode_many(black_box(&lons), black_box(&lats), precision, true).unwrap())
    });

    group.finish();
}

fn benchmark_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage");
    let europe = BoundingBox::new(-10.0, 35.0, 30.0, 60.0);
    let pacific = BoundingBox::new(150.0, -20.0, -170.0, 10.0);

    for p in [2, 3, 4] {
        let precision = Precision::new(p).unwrap();
        group.bench_with_input(BenchmarkId::new("europe", p), &precision, |b, &precision| {
            b.iter(|| bounding_boxes(Some(black_box(&europe)), precision).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("pacific", p), &precision, |b, &precision| {
            b.iter(|| bounding_boxes(Some(black_box(&pacific)), precision).unwrap())
        });
    }

    group.bench_function("whole_grid_p3", |b| {
        b.iter(|| bounding_boxes(None, Precision::new(3).unwrap()).unwrap())
    });

    group.finish();
}

fn benchmark_runs(c: &mut Criterion) {
    let (lons, lats) = sample_points(10_000);
    let mut codes = encode_many(&lons, &lats, Precision::new(2).unwrap(), true).unwrap();
    codes.sort();

    c.bench_function("runs_sorted_10k", |b| b.iter(|| runs(black_box(codes.as_slice()))));
}

fn benchmark_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    let index =
        GeohashIndex::initialize(Arc::new(MemoryStore::new()), Precision::new(4).unwrap())
            .unwrap();
    let (lons, lats) = sample_points(10_000);
    let codes = index.encode(&lons, &lats, true).unwrap();
    index
        .update(codes.iter().cloned().enumerate().map(|(i, code)| (code, i.to_string())))
        .unwrap();

    group.bench_function("update_100", |b| {
        b.iter(|| {
            index
                .update(codes[..100].iter().cloned().map(|code| (code, "v")))
                .unwrap()
        })
    });

    let query = BoundingBox::new(-10.0, 35.0, 30.0, 60.0);
    group.bench_function("query_box_europe", |b| {
        b.iter(|| index.query_box(black_box(&query)).unwrap())
    });

    group.bench_function("keys_all", |b| b.iter(|| index.keys(None).unwrap()));

    group.finish();
}

criterion_group!(
    benches,
    benchmark_codec,
    benchmark_coverage,
    benchmark_runs,
    benchmark_index
);

criterion_main!(benches);
