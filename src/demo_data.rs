//! Random instance generator for the demo binary

use mdvrp_env::InstanceData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of the generated instances
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub n_depot: usize,
    pub n_customer: usize,
    pub n_car: usize,
    pub capacity: f32,
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            n_depot: 2,
            n_customer: 20,
            n_car: 4,
            capacity: 30.0,
            seed: 1234,
        }
    }
}

/// Uniform coordinates in the unit square, integer demands in 1..=9.
/// Cars are dealt to depots round-robin.
pub fn generate(config: &DemoConfig, batch_size: usize) -> Vec<InstanceData> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    (0..batch_size)
        .map(|_| InstanceData {
            depot_xy: (0..config.n_depot).map(|_| point(&mut rng)).collect(),
            customer_xy: (0..config.n_customer).map(|_| point(&mut rng)).collect(),
            demand: (0..config.n_customer)
                .map(|_| rng.random_range(1..=9) as f32)
                .collect(),
            car_start_node: (0..config.n_car).map(|car| car % config.n_depot.max(1)).collect(),
            car_capacity: vec![config.capacity; config.n_car],
        })
        .collect()
}

fn point(rng: &mut StdRng) -> [f32; 2] {
    [rng.random::<f32>(), rng.random::<f32>()]
}
