//! Kindred Benchmark Suite
//!
//! Per-turn costs of the engine's hot paths:
//!   affect_adjust_and_decay ......... one delta plus one decay step
//!   trust_update_burst .............. 20 rapid trust updates
//!   memory_store_at_capacity ........ store into a full 1000-record store
//!   memory_recall_top5_from_1000 .... decay + filter + sort
//!   pattern_detect_500_actions ...... detection over a busy week
//!   reaction_decide ................. score, sample, gate
//!   character_turn .................. react + remember + end of turn

use chrono::{DateTime, Duration, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use kindred_core::Character;
use kindred_core::affect::AffectState;
use kindred_core::memory::EmotionalMemoryStore;
use kindred_core::pattern::{BehaviorAction, PatternTracker};
use kindred_core::reaction::{Intent, Perception, ReactionSelector, Sentiment, Trigger};
use kindred_core::trust::TrustDynamics;
use kindred_core::types::{
    ActionKind, AffectChannel, ContextCategory, ContextVisibility, EmotionalImpact,
};

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_740_000_000, 0).unwrap_or_default()
}

fn impact(i: i64) -> EmotionalImpact {
    let category = ContextCategory::ALL[usize::try_from(i).unwrap_or(0) % ContextCategory::ALL.len()];
    EmotionalImpact::new(AffectChannel::Hurt, 0.5, (i % 20) as f32 / 10.0 - 1.0, category)
}

fn full_store() -> EmotionalMemoryStore {
    let mut store = EmotionalMemoryStore::with_capacity(1000);
    for i in 0..1000 {
        store.store(impact(i), ContextVisibility::Private, [], t0() + Duration::minutes(i * 30));
    }
    store
}

fn bench_affect(c: &mut Criterion) {
    c.bench_function("affect_adjust_and_decay", |b| {
        let mut affect = AffectState::strained();
        b.iter(|| {
            affect.adjust_at(AffectChannel::Anger, black_box(0.05), t0());
            affect.decay_toward_baseline();
        });
    });
}

fn bench_trust(c: &mut Criterion) {
    c.bench_function("trust_update_burst", |b| {
        b.iter(|| {
            let mut dynamics = TrustDynamics::default();
            for i in 0..20 {
                let delta = if i % 3 == 0 { -1.0 } else { 1.5 };
                dynamics.update_trust(black_box(delta), ContextVisibility::Public, t0() + Duration::minutes(i));
            }
            black_box(dynamics.trust());
        });
    });
}

fn bench_memory(c: &mut Criterion) {
    c.bench_function("memory_store_at_capacity", |b| {
        let mut store = full_store();
        let mut i = 1000;
        b.iter(|| {
            i += 1;
            store.store(impact(i), ContextVisibility::Public, [], t0() + Duration::minutes(i * 30));
        });
    });

    c.bench_function("memory_recall_top5_from_1000", |b| {
        let mut store = full_store();
        let now = t0() + Duration::days(30);
        b.iter(|| {
            let hits = store.recall(None, Some(ContextCategory::Conflict), 5, black_box(now));
            black_box(hits.len());
        });
    });
}

fn bench_patterns(c: &mut Criterion) {
    let kinds = [
        ActionKind::CaregivingPresent,
        ActionKind::CaregivingAbsent,
        ActionKind::ConflictAvoid,
        ActionKind::EmpathyShown,
        ActionKind::PublicContradiction,
    ];
    let mut tracker = PatternTracker::default();
    for i in 0..500 {
        let kind = kinds[usize::try_from(i).unwrap_or(0) % kinds.len()];
        tracker.record_action(BehaviorAction::new(
            kind,
            ContextVisibility::Private,
            if i % 2 == 0 { 0.5 } else { -0.5 },
            t0() + Duration::minutes(i * 20),
        ));
    }
    let now = t0() + Duration::minutes(500 * 20);

    c.bench_function("pattern_detect_500_actions", |b| {
        b.iter(|| {
            let found = tracker.detect_patterns(None, black_box(now));
            black_box(found.len());
        });
    });
}

fn bench_reaction(c: &mut Criterion) {
    let selector = ReactionSelector::default();
    let affect = AffectState::betrayed();
    let perception =
        Perception::new(Sentiment::Positive, Intent::Connect, 0.6).with_trigger(Trigger::Affection);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("reaction_decide", |b| {
        b.iter(|| {
            let decision = selector.decide(&affect, black_box(&perception), None, &mut rng);
            black_box(decision.mode);
        });
    });
}

fn bench_character_turn(c: &mut Criterion) {
    let perception =
        Perception::new(Sentiment::Negative, Intent::Blame, 0.7).with_trigger(Trigger::Blame);
    let mut character = Character::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut minute = 0;

    c.bench_function("character_turn", |b| {
        b.iter(|| {
            minute += 1;
            let at = t0() + Duration::minutes(minute);
            let decision = character.react(black_box(&perception), &mut rng, at);
            character.remember(impact(minute), ContextVisibility::Private, at);
            character.end_turn();
            black_box(decision.intensity);
        });
    });
}

criterion_group!(
    benches,
    bench_affect,
    bench_trust,
    bench_memory,
    bench_patterns,
    bench_reaction,
    bench_character_turn,
);
criterion_main!(benches);
