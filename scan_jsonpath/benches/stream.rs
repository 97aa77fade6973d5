use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scan_jsonpath::{JsonPath, Options};

fn catalog(size: usize) -> String {
    let items: Vec<String> = (0..size)
        .map(|i| {
            format!(
                r#"{{"id": {i}, "name": "item_{i}", "price": {}.5, "tags": ["a", "b"], "meta": {{"size": "{}"}}}}"#,
                i % 50,
                ["S", "M", "L"][i % 3]
            )
        })
        .collect();
    format!(r#"{{"catalog": {{"items": [{}]}}}}"#, items.join(","))
}

fn count(path: &JsonPath, input: &str, options: &Options) -> usize {
    path.stream_with_options(input.as_bytes(), options)
        .map(|m| m.unwrap())
        .count()
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let options = Options::default();

    for size in [100, 1000].iter() {
        let input = catalog(*size);
        group.throughput(Throughput::Bytes(input.len() as u64));

        for (name, expression) in [
            ("child", "$.catalog.items[*].name"),
            ("descendant", "$..size"),
            ("filter", "$.catalog.items[?(@.price < 10)].name"),
            ("membership", "$.catalog.items[?(@.meta.size in ['S', 'M'])].id"),
            ("root", "$"),
        ] {
            let path = JsonPath::compile(expression).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), &input, |b, input| {
                b.iter(|| black_box(count(&path, input, &options)));
            });
        }
    }
    group.finish();
}

fn bench_buffer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_size");
    let input = catalog(1000);
    let path = JsonPath::compile("$..name").unwrap();
    group.throughput(Throughput::Bytes(input.len() as u64));

    for buffer_size in [64, 1024, 8 * 1024].iter() {
        let options = Options::default().with_buffer_size(*buffer_size);
        group.bench_with_input(
            BenchmarkId::new("descendant", buffer_size),
            &input,
            |b, input| {
                b.iter(|| black_box(count(&path, input, &options)));
            },
        );
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_filter", |b| {
        b.iter(|| {
            black_box(JsonPath::compile(black_box(
                "$.store.book[?(@.title =~ /^the/i)].author",
            )))
        });
    });
}

criterion_group!(benches, bench_queries, bench_buffer_sizes, bench_compile);
criterion_main!(benches);
