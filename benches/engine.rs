//! Benchmarks for the interaction engine and betweenness centrality.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use opinet::network::betweenness_centrality;
use opinet::{generate_agent_population, run_interactions, TopicContext, TopicGenerator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_interaction_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("interaction_run");
    for &agents in &[20_usize, 100, 250] {
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
        let population = generate_agent_population(agents, 5, 3, None, &mut rng).unwrap();
        let ctx = TopicContext::new(&population.agents, &population.cluster_centers, 5);
        let topics = TopicGenerator::default().generate(&ctx, &mut rng).unwrap();

        group.bench_function(format!("agents{agents}_cycles10"), |b| {
            b.iter_batched(
                || ChaCha8Rng::seed_from_u64(7),
                |mut rng| {
                    run_interactions(&population.agents, &topics, 10, 0.3, &mut rng).unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_betweenness(c: &mut Criterion) {
    let mut group = c.benchmark_group("betweenness");
    for &agents in &[50_usize, 200] {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let population = generate_agent_population(agents, 5, 2, None, &mut rng).unwrap();
        let ctx = TopicContext::new(&population.agents, &population.cluster_centers, 5);
        let topics = TopicGenerator::default().generate(&ctx, &mut rng).unwrap();
        let outcome = run_interactions(&population.agents, &topics, 10, 0.3, &mut rng).unwrap();

        group.bench_function(format!("agents{agents}"), |b| {
            b.iter(|| betweenness_centrality(black_box(&outcome.connections)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_interaction_run, bench_betweenness);
criterion_main!(benches);
