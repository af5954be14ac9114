use std::{hint::black_box, sync::Arc};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use hermes_multitrip::{
    problem::{
        capacity::Capacity,
        destination::DestinationBuilder,
        location::{Location, LocationIdx},
        travel_cost_matrix::TravelMatrices,
        unload_site::UnloadSite,
        vehicle::VehicleBuilder,
        vehicle_profile::VehicleProfile,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        recreate::{
            insertion_strategy::InsertionStrategy,
            recreate_params::{RecreateParams, Threads},
            sort_strategy::BestInsertionSortStrategy,
        },
        solution::working_solution::WorkingSolution,
    },
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

const NUM_DESTINATIONS: usize = 200;
const NUM_VEHICLES: usize = 8;
const NUM_UNLOAD_SITES: usize = 4;

fn random_problem(seed: u64) -> VehicleRoutingProblem {
    let mut rng = SmallRng::seed_from_u64(seed);

    // depot, unload sites, then destinations
    let mut locations = vec![Location::from_cartesian(50.0, 50.0)];
    locations.extend((0..NUM_UNLOAD_SITES).map(|index| {
        let angle = index as f64 * std::f64::consts::FRAC_PI_2;
        Location::from_cartesian(50.0 + 40.0 * angle.cos(), 50.0 + 40.0 * angle.sin())
    }));
    locations.extend((0..NUM_DESTINATIONS).map(|_| {
        Location::from_cartesian(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
    }));

    let destinations = (0..NUM_DESTINATIONS)
        .map(|index| {
            let mut builder = DestinationBuilder::default();
            builder
                .set_external_id(format!("d{index}"))
                .set_location_id(1 + NUM_UNLOAD_SITES + index)
                .set_demand(Capacity::from_vec(vec![rng.random_range(1.0..5.0)]));
            builder.build()
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let vehicles = (0..NUM_VEHICLES)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_vehicle_id(format!("v{index}"))
                .set_profile_id(0)
                .set_depot_location_id(0)
                .set_capacity(Capacity::from_vec(vec![25.0]));
            builder.build()
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let unload_sites = (0..NUM_UNLOAD_SITES)
        .map(|index| {
            let daily_capacity = (index == 0).then(|| Capacity::from_vec(vec![60.0]));
            UnloadSite::new(LocationIdx::new(1 + index), daily_capacity)
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .add_vehicle_profile(VehicleProfile::new(
            "bench".to_owned(),
            TravelMatrices::from_euclidean(&locations, false),
        ))
        .set_destinations(destinations)
        .set_vehicles(vehicles)
        .set_unload_sites(unload_sites)
        .set_locations(locations);

    builder.build().unwrap()
}

fn recreate_benchmark(c: &mut Criterion) {
    let problem = Arc::new(random_problem(2427121));

    for (name, threads) in [
        ("recreate single thread", Threads::Single),
        ("recreate 4 threads", Threads::Multi(4)),
    ] {
        let strategy = InsertionStrategy::new(
            &problem,
            RecreateParams {
                sort_strategy: BestInsertionSortStrategy::Far,
                insertion_threads: threads,
                ..RecreateParams::default()
            },
        )
        .unwrap();

        c.bench_function(name, |b| {
            b.iter_batched(
                || WorkingSolution::new(Arc::clone(&problem)),
                |mut solution| {
                    strategy.recreate(black_box(&mut solution)).unwrap();
                    solution
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, recreate_benchmark);
criterion_main!(benches);
