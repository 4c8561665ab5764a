/// Effect reduction: the only way content changes player state.

use crate::schema::effect::EffectBundle;
use crate::schema::state::PlayerState;

/// Apply an effect bundle, returning the next state.
///
/// Every delta is additive with no clamping. Flags are unioned and items
/// are appended; nothing is ever removed. History, clock and current scene
/// are left alone; those belong to the scene transition, not the bundle.
pub fn apply(state: &PlayerState, effects: &EffectBundle) -> PlayerState {
    let mut next = state.clone();
    apply_in_place(&mut next, effects);
    next
}

pub(crate) fn apply_in_place(state: &mut PlayerState, effects: &EffectBundle) {
    for (stat, delta) in &effects.stats {
        *state.stats.entry(stat.clone()).or_insert(0) += delta;
    }

    state.morality += effects.morality;
    state.trauma += effects.trauma;
    state.stress += effects.stress;

    for (trait_id, delta) in &effects.persona {
        *state.persona_scores.entry(*trait_id).or_insert(0) += delta;
    }

    state
        .inventory
        .extend(effects.inventory_add.iter().cloned());

    for flag in &effects.flags_set {
        if !state.flags.contains(flag) {
            state.flags.insert(flag.clone());
        }
    }

    for (name, delta) in &effects.relationships {
        *state.relationships.entry(name.clone()).or_insert(0) += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::persona::{Persona, PersonaTrait};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn bathtub() -> EffectBundle {
        EffectBundle {
            stats: BTreeMap::from([("stress".to_string(), -1), ("stamina".to_string(), -2)]),
            inventory_add: vec!["water_jugs".to_string(), "bathtub_water".to_string()],
            flags_set: vec!["d1_water_cached".to_string(), "d1_bath_filled".to_string()],
            push_event: Some("Water slaps porcelain.".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn stats_are_additive_and_created_on_demand() {
        let state = PlayerState::default();
        let next = apply(&state, &bathtub());
        assert_eq!(next.stat("stamina"), -2);
        assert_eq!(next.stat("stress"), -1);
        assert_eq!(next.stat("strength"), 5);

        let again = apply(&next, &bathtub());
        assert_eq!(again.stat("stamina"), -4);
    }

    #[test]
    fn input_state_is_untouched() {
        let state = PlayerState::default();
        let before = state.clone();
        let _ = apply(&state, &bathtub());
        assert_eq!(state, before);
    }

    #[test]
    fn scalars_are_unbounded() {
        let fx = EffectBundle {
            morality: -150,
            trauma: 200,
            stress: 999,
            ..Default::default()
        };
        let next = apply(&PlayerState::default(), &fx);
        assert_eq!((next.morality, next.trauma, next.stress), (-150, 200, 999));
    }

    #[test]
    fn inventory_keeps_duplicates_in_order() {
        let next = apply(&apply(&PlayerState::default(), &bathtub()), &bathtub());
        assert_eq!(
            next.inventory,
            vec!["water_jugs", "bathtub_water", "water_jugs", "bathtub_water"]
        );
    }

    #[test]
    fn flags_are_idempotent() {
        let once = apply(&PlayerState::default(), &bathtub());
        let twice = apply(&once, &bathtub());
        assert_eq!(once.flags, twice.flags);
        assert_eq!(twice.flags.len(), 2);
    }

    #[test]
    fn relationships_are_created_on_first_reference() {
        let fx = EffectBundle {
            relationships: BTreeMap::from([("Alex".to_string(), 3), ("Mara".to_string(), -5)]),
            ..Default::default()
        };
        let next = apply(&apply(&PlayerState::default(), &fx), &fx);
        assert_eq!(next.relationship("Alex"), 6);
        assert_eq!(next.relationship("Mara"), -10);
    }

    #[test]
    fn persona_scores_accumulate() {
        let fixer = EffectBundle {
            persona: BTreeMap::from([(PersonaTrait::Fixer, 2)]),
            ..Default::default()
        };
        let warlord = EffectBundle {
            persona: BTreeMap::from([(PersonaTrait::Warlord, 3)]),
            ..Default::default()
        };
        let state = apply(&PlayerState::default(), &fixer);
        assert_eq!(state.persona(), Persona::Trait(PersonaTrait::Fixer));
        let state = apply(&state, &warlord);
        assert_eq!(state.persona(), Persona::Trait(PersonaTrait::Warlord));
        assert_eq!(state.persona(), state.persona());
    }

    #[test]
    fn reducer_leaves_transition_fields_alone() {
        let state = PlayerState::new("solo_water_management");
        let next = apply(&state, &bathtub());
        assert_eq!(next.scene, "solo_water_management");
        assert_eq!(next.clock, state.clock);
        assert!(next.history.is_empty());
    }

    fn random_bundle(rng: &mut StdRng) -> EffectBundle {
        let stats = ["strength", "stamina", "health", "agility"];
        let flags = ["d1_water_cached", "d1_hall_dark", "route_fixer", "d1_wire_trap"];
        let mut fx = EffectBundle::default();
        for _ in 0..rng.gen_range(0..4) {
            let stat = stats[rng.gen_range(0..stats.len())];
            *fx.stats.entry(stat.to_string()).or_insert(0) += rng.gen_range(-5..=5);
        }
        for _ in 0..rng.gen_range(0..3) {
            fx.flags_set
                .push(flags[rng.gen_range(0..flags.len())].to_string());
        }
        fx.morality = rng.gen_range(-3..=3);
        fx.stress = rng.gen_range(-3..=3);
        fx
    }

    #[test]
    fn disjoint_fields_commute() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let fx = random_bundle(&mut rng);
            let stats_only = EffectBundle {
                stats: fx.stats.clone(),
                ..Default::default()
            };
            let flags_only = EffectBundle {
                flags_set: fx.flags_set.clone(),
                ..Default::default()
            };
            let start = PlayerState::default();
            let a = apply(&apply(&start, &stats_only), &flags_only);
            let b = apply(&apply(&start, &flags_only), &stats_only);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn split_bundle_equals_whole_bundle() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let fx = random_bundle(&mut rng);
            let scalars = EffectBundle {
                morality: fx.morality,
                stress: fx.stress,
                ..Default::default()
            };
            let rest = EffectBundle {
                stats: fx.stats.clone(),
                flags_set: fx.flags_set.clone(),
                ..Default::default()
            };
            let start = PlayerState::default();
            assert_eq!(apply(&start, &fx), apply(&apply(&start, &rest), &scalars));
        }
    }
}
