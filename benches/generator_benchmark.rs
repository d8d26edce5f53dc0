use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pg_datasource::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

// Deterministic rows with a mix of literal kinds, including quotes and backslashes
fn generate_rows(num_rows: usize) -> Vec<FieldValues> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..num_rows)
        .map(|i| {
            let name = match rng.random_range(0..3) {
                0 => format!("user-{i}"),
                1 => format!("O'Brien {i}"),
                _ => format!(r"C:\home\{i}"),
            };
            FieldValues::new()
                .with("name", name)
                .with("age", rng.random_range(18..90_i64))
                .with("score", rng.random_range(0.0..100.0_f64))
                .with("active", rng.random_bool(0.5))
        })
        .collect()
}

fn filtered_criteria() -> Criteria {
    let users = Collection::new("users").with_alias("u");
    let posts = Collection::new("posts").with_alias("p");
    Criteria::new(users.clone())
        .select([users.field("id"), users.field("name"), posts.field("title")])
        .left_join(posts.clone(), posts.field("user_id").equals_field(users.field("id")))
        .filter(users.field("age").between(18, 65))
        .filter(users.field("name").like("%ann%").or(users.field("city").is_in(["Oslo", "Lima"])))
        .order_by(users.field("name"), Direction::Asc)
        .limit(50)
}

fn generator_statements(c: &mut Criterion) {
    let generator = PostgresGenerator;
    let mut group = c.benchmark_group("generator");

    let criteria = filtered_criteria();
    group.bench_function("select", |b| {
        b.iter(|| generator.generate_select(black_box(&criteria)));
    });

    for num_rows in [10_usize, 100, 1_000] {
        let rows = generate_rows(num_rows);
        let users = Collection::new("users");
        group.throughput(Throughput::Elements(num_rows as u64));
        group.bench_with_input(BenchmarkId::new("multiple_insert", num_rows), &rows, |b, rows| {
            b.iter(|| generator.generate_multiple_insert(black_box(rows), &users));
        });
    }

    let params: Vec<Value> = generate_rows(20)
        .into_iter()
        .filter_map(|row| row.get("name").cloned())
        .collect();
    let sql = format!(
        "SELECT * FROM users WHERE name IN ({}) AND note = 'literal ?' -- trailing ?",
        vec!["?"; params.len()].join(", ")
    );
    group.throughput(Throughput::Elements(params.len() as u64));
    group.bench_function("interpolate_parameters", |b| {
        b.iter(|| generator.interpolate_parameters(black_box(&sql), &Parameters::Positional(&params)));
    });

    group.finish();
}

criterion_group!(benches, generator_statements);
criterion_main!(benches);
