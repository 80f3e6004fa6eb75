mod common;

use autoevo_core::config::AutoEvoConfig;
use autoevo_core::ecosystem::PatchEcosystem;
use autoevo_core::food_source::FoodSourceKind;
use autoevo_core::snapshot::SpeciesTraits;
use autoevo_data::{Patch, Species};
use common::{algae, chemotroph, registry, snapshots, sunlit};
use proptest::prelude::*;

prop_compose! {
    fn arb_hunter()(
        aggression in 0.0f64..400.0,
        activity in 0.0f64..400.0,
        cytoplasm in 1usize..6,
        walled in any::<bool>()
    ) -> Species {
        let membrane = if walled { "cellulose" } else { "single" };
        Species::new(3, "Hunter", membrane)
            .with_organelles(std::iter::repeat("cytoplasm").take(cytoplasm))
            .with_organelles(["flagellum", "pilus"])
            .with_behaviour(aggression, activity)
    }
}

prop_compose! {
    fn arb_patch()(
        sunlight in 0.0f64..500.0,
        sulfide in 0.0f64..1.0,
        algae in -10i64..5000,
        chemotrophs in 0i64..5000,
        hunters in 0i64..200
    ) -> Patch {
        Patch::new(0, "Arbitrary", sunlit(sunlight).with_cloud("hydrogensulfide", sulfide, 300.0))
            .with_population(1, algae)
            .with_population(2, chemotrophs)
            .with_population(3, hunters)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_allocation_bounded_and_non_negative(hunter in arb_hunter(), patch in arb_patch()) {
        let config = AutoEvoConfig::default();
        let snaps = snapshots(&[algae(1), chemotroph(2), hunter], &config);
        let ecosystem = PatchEcosystem::build(&patch, &snaps, &registry(), &config).unwrap();

        for source in ecosystem.food_sources() {
            let total = source.total_energy_available();
            prop_assert!(total >= 0.0);
            let shares = ecosystem.allocate(source);
            for (competitor, &share) in ecosystem.competitors().iter().zip(&shares) {
                prop_assert!(source.fitness_score(competitor.species.as_ref()) >= 0.0);
                prop_assert!(share >= 0.0);
            }
            let sum: f64 = shares.iter().sum();
            prop_assert!(sum <= total, "allocated {} of {}", sum, total);
            if shares.iter().any(|&share| share > 0.0) {
                prop_assert!(total - sum <= total * 1e-12, "lost {} of {}", total - sum, total);
            }
        }
    }

    #[test]
    fn test_no_species_feeds_on_itself(hunter in arb_hunter(), patch in arb_patch()) {
        let config = AutoEvoConfig::default();
        let snaps = snapshots(&[algae(1), chemotroph(2), hunter], &config);
        let ecosystem = PatchEcosystem::build(&patch, &snaps, &registry(), &config).unwrap();

        for source in ecosystem.food_sources() {
            if let FoodSourceKind::Heterotrophic { prey } = source.kind() {
                let shares = ecosystem.allocate(source);
                for (competitor, &share) in ecosystem.competitors().iter().zip(&shares) {
                    if competitor.species.id() == prey {
                        prop_assert_eq!(share, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_populations_within_bounds(hunter in arb_hunter(), patch in arb_patch()) {
        let mut config = AutoEvoConfig::default();
        config.world.max_population_per_patch = 10_000;
        let snaps = snapshots(&[algae(1), chemotroph(2), hunter], &config);
        let outcome = PatchEcosystem::build(&patch, &snaps, &registry(), &config)
            .unwrap()
            .solve(&config);

        for source in &outcome.sources {
            prop_assert!(source.allocated <= source.total_energy);
        }
        prop_assert!(outcome.allocated_energy() <= outcome.total_energy());
        for result in &outcome.species {
            prop_assert!(result.energy >= 0.0);
            prop_assert!((0..=10_000).contains(&result.population));
            prop_assert_eq!(result.delta, result.population - result.previous_population);
        }
    }
}
