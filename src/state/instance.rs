//! Problem instances - host-side input and its batched tensor form

use std::fs;
use std::path::Path;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::infra::EnvError;

/// One routing problem as supplied by an external generator or file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub depot_xy: Vec<[f32; 2]>,
    pub customer_xy: Vec<[f32; 2]>,
    /// Demand per customer, indexed in customer space
    pub demand: Vec<f32>,
    /// Home depot (global node index) per car
    pub car_start_node: Vec<usize>,
    /// Initial capacity per car
    pub car_capacity: Vec<f32>,
}

impl InstanceData {
    pub fn n_depot(&self) -> usize {
        self.depot_xy.len()
    }

    pub fn n_customer(&self) -> usize {
        self.customer_xy.len()
    }

    pub fn n_car(&self) -> usize {
        self.car_start_node.len()
    }

    fn validate(&self, index: usize) -> Result<(), EnvError> {
        if self.n_depot() == 0 || self.n_customer() == 0 || self.n_car() == 0 {
            return Err(EnvError::ShapeMismatch {
                what: "node and car counts",
                expected: vec![1, 1, 1],
                found: vec![self.n_depot(), self.n_customer(), self.n_car()],
            });
        }
        if self.demand.len() != self.n_customer() {
            return Err(EnvError::ShapeMismatch {
                what: "demand",
                expected: vec![self.n_customer()],
                found: vec![self.demand.len()],
            });
        }
        if self.car_capacity.len() != self.n_car() {
            return Err(EnvError::ShapeMismatch {
                what: "car_capacity",
                expected: vec![self.n_car()],
                found: vec![self.car_capacity.len()],
            });
        }
        if let Some((car, &node)) = self
            .car_start_node
            .iter()
            .enumerate()
            .find(|(_, node)| **node >= self.n_depot())
        {
            return Err(EnvError::InvalidHomeDepot {
                instance: index,
                car,
                node,
                n_depot: self.n_depot(),
            });
        }
        Ok(())
    }
}

/// Read a JSON array of instances.
pub fn load_instances<P: AsRef<Path>>(path: P) -> Result<Vec<InstanceData>, EnvError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// A batch of instances held as tensors on one device.
#[derive(Debug, Clone)]
pub struct Instance<B: Backend> {
    /// [batch, n_depot, 2]
    pub depot_xy: Tensor<B, 3>,
    /// [batch, n_customer, 2]
    pub customer_xy: Tensor<B, 3>,
    /// [batch, n_customer]
    pub demand: Tensor<B, 2>,
    /// [batch, n_car]
    pub car_start_node: Tensor<B, 2, Int>,
    /// [batch, n_car]
    pub car_capacity: Tensor<B, 2>,
}

impl<B: Backend> Instance<B> {
    /// Wrap pre-built tensors after checking that their dimensions agree.
    pub fn new(
        depot_xy: Tensor<B, 3>,
        customer_xy: Tensor<B, 3>,
        demand: Tensor<B, 2>,
        car_start_node: Tensor<B, 2, Int>,
        car_capacity: Tensor<B, 2>,
    ) -> Result<Self, EnvError> {
        let [batch, n_depot, depot_coords] = depot_xy.dims();
        let [_, n_customer, _] = customer_xy.dims();
        let [_, n_car] = car_start_node.dims();

        check_dims("depot_xy", &[batch, n_depot, 2], &[batch, n_depot, depot_coords])?;
        check_dims("customer_xy", &[batch, n_customer, 2], &customer_xy.dims())?;
        check_dims("demand", &[batch, n_customer], &demand.dims())?;
        check_dims("car_capacity", &[batch, n_car], &car_capacity.dims())?;
        if batch == 0 {
            return Err(EnvError::EmptyBatch);
        }

        Ok(Self {
            depot_xy,
            customer_xy,
            demand,
            car_start_node,
            car_capacity,
        })
    }

    /// Stack host-side instances into one batch on `device`.
    pub fn from_batch(batch: &[InstanceData], device: &B::Device) -> Result<Self, EnvError> {
        let first = batch.first().ok_or(EnvError::EmptyBatch)?;
        let (n_depot, n_customer, n_car) = (first.n_depot(), first.n_customer(), first.n_car());

        for (index, data) in batch.iter().enumerate() {
            data.validate(index)?;
            check_dims(
                "instance sizes",
                &[n_depot, n_customer, n_car],
                &[data.n_depot(), data.n_customer(), data.n_car()],
            )?;
        }

        let size = batch.len();
        let flatten_xy = |select: fn(&InstanceData) -> &Vec<[f32; 2]>| -> Vec<f32> {
            batch
                .iter()
                .flat_map(|data| select(data).iter().flat_map(|xy| xy.iter().copied()))
                .collect()
        };
        let depot_xy = flatten_xy(|data| &data.depot_xy);
        let customer_xy = flatten_xy(|data| &data.customer_xy);
        let demand: Vec<f32> = batch.iter().flat_map(|d| d.demand.iter().copied()).collect();
        let start: Vec<i64> = batch
            .iter()
            .flat_map(|d| d.car_start_node.iter().map(|&n| n as i64))
            .collect();
        let capacity: Vec<f32> = batch
            .iter()
            .flat_map(|d| d.car_capacity.iter().copied())
            .collect();

        Self::new(
            Tensor::from_data(TensorData::new(depot_xy, [size, n_depot, 2]), device),
            Tensor::from_data(TensorData::new(customer_xy, [size, n_customer, 2]), device),
            Tensor::from_data(TensorData::new(demand, [size, n_customer]), device),
            Tensor::from_data(TensorData::new(start, [size, n_car]), device),
            Tensor::from_data(TensorData::new(capacity, [size, n_car]), device),
        )
    }

    pub fn batch_size(&self) -> usize {
        self.depot_xy.dims()[0]
    }

    pub fn n_depot(&self) -> usize {
        self.depot_xy.dims()[1]
    }

    pub fn n_customer(&self) -> usize {
        self.customer_xy.dims()[1]
    }

    pub fn n_node(&self) -> usize {
        self.n_depot() + self.n_customer()
    }

    pub fn n_car(&self) -> usize {
        self.car_start_node.dims()[1]
    }

    pub fn device(&self) -> B::Device {
        self.depot_xy.device()
    }

    /// Depots followed by customers: [batch, n_node, 2]
    pub fn node_xy(&self) -> Tensor<B, 3> {
        Tensor::cat(vec![self.depot_xy.clone(), self.customer_xy.clone()], 1)
    }
}

fn check_dims(what: &'static str, expected: &[usize], found: &[usize]) -> Result<(), EnvError> {
    if expected != found {
        return Err(EnvError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}
