use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use knockout::{
    MatchStatus, Tournament, TournamentConfig, UserId,
    tournament::{Registry, build_round},
};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

fn config() -> TournamentConfig {
    TournamentConfig {
        shuffle_on_start: false,
        max_participants: 1024,
        ..TournamentConfig::default()
    }
}

/// Helper to settle every open match of the current round for player1
fn play_round(t: &mut Tournament) {
    let open: Vec<(String, UserId, UserId)> = t
        .matches_in_round(t.round_counter())
        .into_iter()
        .filter(|m| m.status == MatchStatus::InProgress)
        .filter_map(|m| Some((m.id.clone(), m.player1?, m.player2?)))
        .collect();

    for (id, p1, p2) in open {
        t.report_result(&id, p1, p1).unwrap();
        t.report_result(&id, p2, p1).unwrap();
    }
}

/// Benchmark pairing a single round
fn bench_build_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_round");
    for n in [8usize, 64, 512] {
        let players: Vec<UserId> = (1..=n as i64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &players, |b, players| {
            b.iter(|| build_round(1, black_box(players)));
        });
    }
    group.finish();
}

/// Benchmark Fisher-Yates reseeding of the registry
fn bench_shuffle(c: &mut Criterion) {
    let ids: Vec<UserId> = (1..=512).collect();
    let mut registry = Registry::from_user_ids(&ids).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("shuffle_512", |b| {
        b.iter(|| registry.shuffle(&mut rng));
    });
}

/// Benchmark a whole tournament from bracket creation to champion
fn bench_full_tournament(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tournament");
    for n in [16usize, 128, 1000] {
        let players: Vec<UserId> = (1..=n as i64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &players, |b, players| {
            b.iter(|| {
                let mut t = Tournament::new(1, "Bench", config()).unwrap();
                t.create_bracket(players).unwrap();
                while t.champion().is_none() {
                    play_round(&mut t);
                    if t.champion().is_none() {
                        t.advance_round().unwrap();
                    }
                }
                black_box(t.champion())
            });
        });
    }
    group.finish();
}

/// Benchmark reporting on a large bracket (match lookup by ID)
fn bench_report_lookup(c: &mut Criterion) {
    let players: Vec<UserId> = (1..=1000).collect();
    let mut base = Tournament::new(1, "Lookup", config()).unwrap();
    base.create_bracket(&players).unwrap();

    c.bench_function("report_result_1000", |b| {
        b.iter_batched(
            || base.clone(),
            |mut t| t.report_result("r1m500", 999, 999).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(bracket_generation, bench_build_round, bench_shuffle);

criterion_group!(
    tournament_operations,
    bench_full_tournament,
    bench_report_lookup,
);

criterion_main!(bracket_generation, tournament_operations);
