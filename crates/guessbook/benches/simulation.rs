use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use guessbook::prelude::*;
use guessbook::{parse_formula, DefinedVariables};

const DOCUMENT: &str = "
Price per unit [price = triangular(8, 10, 15)], demand [units = normal(1000, 150)]
and churn [churn = bounded_normal(0, 0.2)] give
[revenue = price * units * (1 - churn)].
Costs are [fixed = uniform(2000, 2600)] plus [variable = units * uniform(2, 3)],
so [profit = revenue - fixed - variable] and [loss = profit < 0].
";

fn bench_parse(c: &mut Criterion) {
    let defined: DefinedVariables = ["price", "units", "churn"].into_iter().collect();

    c.bench_function("parse_formula", |b| {
        b.iter(|| parse_formula(black_box("max(price * units * (1 - churn), 0) ^ 2"), &defined).unwrap())
    });

    c.bench_function("parse_document", |b| {
        b.iter(|| Document::parse(black_box(DOCUMENT)))
    });
}

fn bench_simulation(c: &mut Criterion) {
    let doc = Document::parse(DOCUMENT);

    let mut group = c.benchmark_group("simulation");
    group.sample_size(10);

    for iterations in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(iterations as u64));

        group.bench_with_input(
            BenchmarkId::new("sequential", iterations),
            &iterations,
            |b, &iterations| {
                let options = SimulationOptions {
                    iterations,
                    seed: Some(1),
                    target: Some("profit".into()),
                    ..Default::default()
                };
                b.iter(|| black_box(doc.simulate_with_options(&options).unwrap()))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("parallel", iterations),
            &iterations,
            |b, &iterations| {
                let options = SimulationOptions {
                    iterations,
                    seed: Some(1),
                    target: Some("profit".into()),
                    parallel: true,
                    ..Default::default()
                };
                b.iter(|| black_box(doc.simulate_with_options(&options).unwrap()))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_simulation);
criterion_main!(benches);
