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

use hangar_alloc::{allocation::HangarAllocation, can_remove_facility, registry::Skip};
use hangar_model::{
    base::{Base, BaseBuilder, Craft, Production, Transfer},
    index::{FacilityIndex, TransferIndex},
    rules::{FacilityRule, Ruleset, RulesetBuilder},
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

fn log_hangars(rules: &Ruleset, base: &Base) {
    for (i, facility) in base.facilities().iter().enumerate() {
        let rule = rules.facility_rule(facility.rule());
        if !rule.is_hangar() {
            continue;
        }
        let index = FacilityIndex::new(i);
        info!(
            facility = %index,
            name = rule.name(),
            built = facility.is_built(),
            occupancy = base.hangar_occupancy(index),
            capacity = rule.crafts(),
            "hangar"
        );
    }
    info!(
        used = base.used_hangars(),
        available = base.available_hangars(rules),
        "hangar space"
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();

    let mut rb = RulesetBuilder::new();
    let interceptor = rb.add_craft_rule("STR_INTERCEPTOR");
    let skyranger = rb.add_craft_rule("STR_SKYRANGER");
    let avenger = rb.add_craft_rule("STR_AVENGER");
    let small =
        rb.add_facility_rule(FacilityRule::hangar("STR_SMALL_HANGAR", 1).allowing([interceptor]));
    let hangar = rb.add_facility_rule(
        FacilityRule::hangar("STR_HANGAR", 2).allowing([interceptor, skyranger]),
    );
    let large = rb.add_facility_rule(FacilityRule::hangar("STR_LARGE_HANGAR", 3));
    let quarters = rb.add_facility_rule(FacilityRule::new("STR_LIVING_QUARTERS"));
    let rules = rb.build();
    info!("{}", rules);

    let mut bb = BaseBuilder::new("Nevada");
    bb.add_facility(quarters);
    let small_hangar = bb.add_facility(small);
    let main_hangar = bb.add_facility(hangar);
    let new_hangar = bb.add_facility_under_construction(large, 2);
    bb.add_craft(Craft::new(skyranger).with_hangar(main_hangar));
    bb.add_craft(Craft::new(interceptor));
    let mut base = bb.build(&rules)?;
    info!("{}", base);

    // Day 0: settle the craft already at the base.
    HangarAllocation::new(&rules, &mut base, Skip::new()).assign_all();
    log_hangars(&rules, &base);

    // Day 0: buy an interceptor and start building a Skyranger.
    let mut bought = Transfer::of_craft(Craft::new(interceptor));
    let purchase =
        HangarAllocation::new(&rules, &base, Skip::new()).try_add_craft_transfer(&mut bought);
    if let Err(e) = purchase {
        warn!(error = %e, "purchase refused");
        return Ok(());
    }
    base.push_transfer(bought);

    let mut order = Production::of_craft(skyranger);
    if HangarAllocation::new(&rules, &base, Skip::new()).add_craft_production(&mut order) {
        base.push_production(order);
    } else {
        warn!("production refused: no hangar space");
    }

    // An Avenger needs the large hangar, which is not finished yet.
    if let Err(e) = HangarAllocation::new(&rules, &base, Skip::new()).try_add_craft_type(avenger) {
        info!(error = %e, "Avenger cannot be ordered yet");
    }

    for day in 1..=3 {
        for facility in (0..base.num_facilities()).map(FacilityIndex::new) {
            if base.facility_mut(facility).advance_construction() {
                info!(day, %facility, "construction finished");
            }
        }

        if day == 2 {
            let arrived = base.remove_transfer(TransferIndex::new(0));
            if let Some(craft) = arrived.into_craft() {
                info!(day, hangar = ?craft.hangar(), "interceptor arrived");
                base.push_craft(craft);
            }
        }

        let mut alloc = HangarAllocation::new(&rules, &mut base, Skip::new());
        let commits = alloc.assign_all();
        info!(day, commits, "reallocated");
        info!("{}", alloc.statistics());
    }
    log_hangars(&rules, &base);

    match HangarAllocation::new(&rules, &base, Skip::new()).try_add_craft_type(avenger) {
        Ok(facility) => info!(%facility, "Avenger can now be ordered"),
        Err(e) => warn!(error = %e, "Avenger still cannot be ordered"),
    }

    for facility in [small_hangar, main_hangar, new_hangar] {
        info!(
            %facility,
            removable = can_remove_facility(&rules, &base, facility),
            "dismantle check"
        );
    }

    Ok(())
}
