//! 位置インデックスの構築と縦クロスワード解決のベンチマーク
//!
//! テスト用の駅データを複製した大きめのコーパスに対して、
//! 逐次・並列それぞれの構築速度と解決速度を計測します。

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ekitate::{
    Corpus, CrosswordResolver, CsvRecordSource, IndexBuilder, PrioritySet, Query,
    RegionSelection, ScriptMode,
};

const STATIONS_CSV: &str = include_str!("../src/tests/resources/stations.csv");
const REPLICAS: u32 = 250;

const QUERIES: &[&str] = &["しお", "新大", "おおさか", "京都大阪", "ユーカリ", "新宿三丁目"];

fn corpus() -> Corpus {
    let drafts = CsvRecordSource::from_reader(STATIONS_CSV.as_bytes()).unwrap();
    Corpus::from_drafts((0..REPLICAS).flat_map(|i| {
        drafts.iter().cloned().map(move |mut d| {
            d.region = (d.region + i) % 47 + 1;
            d
        })
    }))
    .unwrap()
}

fn bench_build(c: &mut Criterion) {
    let corpus = corpus();

    let mut group = c.benchmark_group("Index Build");
    group.throughput(Throughput::Elements(corpus.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(20);

    for mode in ScriptMode::ALL {
        group.bench_function(BenchmarkId::new("Single", mode.name()), |b| {
            b.iter(|| IndexBuilder::build(&corpus, mode).unwrap());
        });
        group.bench_function(BenchmarkId::new("Parallel", mode.name()), |b| {
            let builder = IndexBuilder::new().with_shard_size(1024).unwrap();
            b.iter(|| builder.build_parallel(&corpus, mode).unwrap());
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let corpus = corpus();
    let index = IndexBuilder::build(&corpus, ScriptMode::Folded).unwrap();
    let priority = PrioritySet::from_regions(&corpus, &RegionSelection::parse(["【関東】"]));
    let queries: Vec<Query> = QUERIES
        .iter()
        .map(|q| Query::new(q, ScriptMode::Folded))
        .collect();

    let mut group = c.benchmark_group("Crossword Resolve");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.measurement_time(Duration::from_secs(10));

    for parallel in [false, true] {
        let resolver = CrosswordResolver::new(&index).parallel(parallel);
        let name = if parallel { "Parallel" } else { "Sequential" };
        group.bench_function(BenchmarkId::new(name, "Queries"), |b| {
            b.iter(|| {
                for query in &queries {
                    resolver.resolve(query, &priority, &corpus);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_resolve);
criterion_main!(benches);
