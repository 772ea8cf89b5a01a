//! Admission checks for cargo entering the packer.
//!
//! The packer accepts any finite input and never fails. Everything that would
//! make its output meaningless is rejected here, before a run starts.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{CargoItem, TruckConfig, ValidationError};
use crate::types::EPSILON_BOUNDS;

/// Reasons a load is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("Invalid truck configuration: {0}")]
    InvalidTruck(ValidationError),
    #[error("Invalid cargo item '{id}': {source}")]
    InvalidCargo {
        id: String,
        #[source]
        source: ValidationError,
    },
    #[error("Cargo id '{0}' is used more than once")]
    DuplicateId(String),
    #[error("Too many cargo items: {count} (at most {max} per load)")]
    TooManyItems { count: usize, max: usize },
    #[error("Cargo item '{id}' exceeds the truck {axis}: {value} > {limit}")]
    ExceedsTruck {
        id: String,
        axis: &'static str,
        value: f64,
        limit: f64,
    },
}

/// Limits applied at the boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntakeLimits {
    /// Maximum number of items per load
    pub max_cargo_items: usize,
    /// Tolerance when comparing item and truck dimensions
    pub epsilon: f64,
}

impl IntakeLimits {
    pub const DEFAULT_MAX_CARGO_ITEMS: usize = 500;
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_cargo_items: Self::DEFAULT_MAX_CARGO_ITEMS,
            epsilon: EPSILON_BOUNDS,
        }
    }
}

/// A truck and cargo list that passed admission.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmittedLoad {
    truck: TruckConfig,
    cargo: Vec<CargoItem>,
}

impl AdmittedLoad {
    pub fn truck(&self) -> &TruckConfig {
        &self.truck
    }

    pub fn cargo(&self) -> &[CargoItem] {
        &self.cargo
    }

    pub fn cargo_count(&self) -> usize {
        self.cargo.len()
    }

    pub fn into_parts(self) -> (TruckConfig, Vec<CargoItem>) {
        (self.truck, self.cargo)
    }
}

/// Checks a truck and its cargo list; returns the first violation.
///
/// Cargo order is preserved.
pub fn admit(
    truck: TruckConfig,
    cargo: Vec<CargoItem>,
    limits: &IntakeLimits,
) -> Result<AdmittedLoad, IntakeError> {
    truck.validate("Truck").map_err(IntakeError::InvalidTruck)?;

    if cargo.len() > limits.max_cargo_items {
        return Err(IntakeError::TooManyItems {
            count: cargo.len(),
            max: limits.max_cargo_items,
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(cargo.len());
    for item in &cargo {
        item.validate().map_err(|source| IntakeError::InvalidCargo {
            id: item.id.clone(),
            source,
        })?;

        if !seen.insert(item.id.as_str()) {
            return Err(IntakeError::DuplicateId(item.id.clone()));
        }

        check_against_truck(item, &truck, limits.epsilon)?;
    }

    Ok(AdmittedLoad { truck, cargo })
}

fn check_against_truck(
    item: &CargoItem,
    truck: &TruckConfig,
    epsilon: f64,
) -> Result<(), IntakeError> {
    let axes = [
        ("length", item.dims.length, truck.length),
        ("width", item.dims.width, truck.width),
        ("height", item.dims.height, truck.height),
    ];

    for (axis, value, limit) in axes {
        if value > limit + epsilon {
            return Err(IntakeError::ExceedsTruck {
                id: item.id.clone(),
                axis,
                value,
                limit,
            });
        }
    }
    Ok(())
}
