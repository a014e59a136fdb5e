// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hangar_alloc::{allocation::HangarAllocation, registry::Skip};
use hangar_model::base::{Base, BaseBuilder, Craft};
use hangar_model::index::CraftRuleIndex;
use hangar_model::rules::{FacilityRule, Ruleset, RulesetBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

const NUM_CRAFT_TYPES: usize = 4;

fn build_rules(rng: &mut ChaCha8Rng) -> Ruleset {
    let mut rb = RulesetBuilder::new();
    let crafts: Vec<CraftRuleIndex> = (0..NUM_CRAFT_TYPES)
        .map(|i| rb.add_craft_rule(format!("STR_CRAFT_{}", i)))
        .collect();
    for i in 0..6 {
        // Every hangar accepts at least one type.
        let mut allowed = vec![crafts[i % NUM_CRAFT_TYPES]];
        allowed.extend(crafts.iter().copied().filter(|_| rng.random_bool(0.5)));
        rb.add_facility_rule(
            FacilityRule::hangar(format!("STR_HANGAR_{}", i), rng.random_range(1..=4))
                .allowing(allowed),
        );
    }
    rb.build()
}

/// A base whose hangars are filled to `fill` of their combined capacity.
fn build_saturated_base(rng: &mut ChaCha8Rng, rules: &Ruleset, fill: f64) -> Base {
    let mut bb = BaseBuilder::new("Bench");
    let mut capacity = 0;
    while capacity < 16 {
        let rule = rng.random_range(0..rules.num_facility_rules());
        let facility = hangar_model::index::FacilityRuleIndex::new(rule);
        capacity += rules.facility_rule(facility).crafts();
        bb.add_facility(facility);
    }

    let wanted = ((16.0 * fill) as usize).min(16);
    let mut placed = 0;
    let mut attempts = 0;
    while placed < wanted && attempts < 1000 {
        attempts += 1;
        let mut draft = bb.clone().build(rules).expect("generated base is valid");
        let rule = CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES));
        draft.push_craft(Craft::new(rule));
        if HangarAllocation::new(rules, &draft, Skip::new()).is_feasible() {
            bb.add_craft(Craft::new(rule));
            placed += 1;
        }
    }

    bb.build(rules).expect("generated base is valid")
}

fn bench_assign_all(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut group = c.benchmark_group("assign_all");

    for &fill in &[0.5, 0.75, 1.0] {
        let rules = build_rules(&mut rng);
        let base = build_saturated_base(&mut rng, &rules, fill);
        group.throughput(Throughput::Elements(base.num_crafts() as u64));

        group.bench_with_input(
            BenchmarkId::new("fill", format!("{:.2}", fill)),
            &base,
            |b, base| {
                b.iter_batched_ref(
                    || base.clone(),
                    |base| {
                        let mut alloc = HangarAllocation::new(&rules, base, Skip::new());
                        black_box(alloc.assign_all())
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

fn bench_add_until_full(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let rules = build_rules(&mut rng);
    let base = build_saturated_base(&mut rng, &rules, 0.25);
    let requests: Vec<CraftRuleIndex> = (0..32)
        .map(|_| CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES)))
        .collect();

    c.bench_function("add_craft_type_until_full", |b| {
        b.iter(|| {
            let mut alloc = HangarAllocation::new(&rules, &base, Skip::new());
            let mut placed = 0;
            for &rule in &requests {
                if alloc.add_craft_type(black_box(rule)) {
                    placed += 1;
                }
            }
            black_box(placed)
        })
    });
}

criterion_group!(benches, bench_assign_all, bench_add_until_full);
criterion_main!(benches);
