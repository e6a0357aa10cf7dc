mod demo_data;

use burn::prelude::*;
use burn::tensor::ElementConversion;
use demo_data::DemoConfig;
use dotenv::dotenv;
use mdvrp_env::decoder::{NearestPolicy, RolloutMetrics};
use mdvrp_env::state::load_instances;
use mdvrp_env::{DecodeType, Instance, InstanceData, Rollout, RolloutConfig, RoutingEnv};
use std::env;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[cfg(not(feature = "wgpu"))]
type AppBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
type AppBackend = burn::backend::Wgpu;

fn get_env_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mdvrp_env=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Per-node features `[x, y, demand]`; depots carry zero demand.
fn node_features<B: Backend>(instance: &Instance<B>) -> Tensor<B, 3> {
    let depot_demand = Tensor::zeros(
        [instance.batch_size(), instance.n_depot()],
        &instance.device(),
    );
    let demand = Tensor::cat(vec![depot_demand, instance.demand.clone()], 1).unsqueeze_dim::<3>(2);
    Tensor::cat(vec![instance.node_xy(), demand], 2)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let defaults = DemoConfig::default();
    let demo = DemoConfig {
        n_depot: get_env_var("MDVRP_DEPOTS").unwrap_or(defaults.n_depot),
        n_customer: get_env_var("MDVRP_CUSTOMERS").unwrap_or(defaults.n_customer),
        n_car: get_env_var("MDVRP_CARS").unwrap_or(defaults.n_car),
        capacity: get_env_var("MDVRP_CAPACITY").unwrap_or(defaults.capacity),
        seed: get_env_var("MDVRP_SEED").unwrap_or(defaults.seed),
    };
    let batch_size = get_env_var("MDVRP_BATCH").unwrap_or(8);
    let rollouts = get_env_var("MDVRP_ROLLOUTS").unwrap_or(1);
    let decode = match env::var("MDVRP_DECODE") {
        Ok(value) => DecodeType::from_str(&value)?,
        Err(_) => DecodeType::Greedy,
    };

    let batch: Vec<InstanceData> = match env::var("MDVRP_INSTANCE_FILE") {
        Ok(path) => {
            tracing::info!("Loading instances from {}", path);
            load_instances(&path)?
        }
        Err(_) => {
            tracing::info!(
                "Generating {} instances ({} depots, {} customers, {} cars, seed {})",
                batch_size,
                demo.n_depot,
                demo.n_customer,
                demo.n_car,
                demo.seed
            );
            demo_data::generate(&demo, batch_size)
        }
    };

    let device = Default::default();
    let instance = Instance::<AppBackend>::from_batch(&batch, &device)?;
    let embeddings = node_features(&instance);
    let mut env = RoutingEnv::new(instance, embeddings)?;

    let rollout = Rollout::new(RolloutConfig {
        max_steps: None,
        decode,
    });
    let mut policy = NearestPolicy::default();
    let mut metrics = RolloutMetrics::default();

    tracing::info!("Running {} rollout(s) with {:?} decoding", rollouts, decode);
    for index in 0..rollouts {
        let output = rollout.run(&mut env, &mut policy)?;
        tracing::debug!(
            "Rollout {}: {} steps, {} instances fully served",
            index,
            output.steps,
            env.all_customers_visited()
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>()
        );
        metrics.record(&output)?;
    }

    metrics.print_summary();
    Ok(())
}
