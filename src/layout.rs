//! Display layout and load statistics derived from a packing result.
//!
//! Manual position overrides only move boxes on screen. Statistics are always
//! computed from the packer's own output.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{PackedItem, TruckConfig};
use crate::types::{Dimensional, Vec3};

/// Manually chosen display positions, keyed by cargo id.
///
/// Lives independently of packing runs; a re-pack does not clear it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionOverrides {
    positions: HashMap<String, Vec3>,
}

impl PositionOverrides {
    /// Creates an empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the item with `id` to `position`, replacing an earlier override.
    pub fn set(&mut self, id: impl Into<String>, position: Vec3) {
        self.positions.insert(id.into(), position);
    }

    /// Removes the override for one item.
    pub fn remove(&mut self, id: &str) -> Option<Vec3> {
        self.positions.remove(id)
    }

    /// Discards every override.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Looks up the override for an item.
    pub fn get(&self, id: &str) -> Option<Vec3> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec3)> for PositionOverrides {
    fn from_iter<I: IntoIterator<Item = (K, Vec3)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Merges overrides onto packed output for display.
///
/// Only the position of an overridden item changes. Ids without a packed
/// item are ignored.
pub fn apply_overrides(packed: &[PackedItem], overrides: &PositionOverrides) -> Vec<PackedItem> {
    packed
        .iter()
        .map(|p| match overrides.get(p.id()) {
            Some(position) => p.moved_to(position),
            None => p.clone(),
        })
        .collect()
}

/// Volume bookkeeping for one packing run.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LoadMetrics {
    /// Volume of the cargo bay in m³
    pub total_volume: f64,
    /// Summed volume of all packed items in m³
    pub packed_volume: f64,
    /// Free volume in m³
    pub available_volume: f64,
    /// Packed share of the bay, rounded to one decimal
    pub utilization_percent: f64,
}

impl LoadMetrics {
    /// Computes metrics from raw packed output.
    ///
    /// # Examples
    /// ```
    /// use truck_packer::layout::LoadMetrics;
    /// use truck_packer::model::{CargoItem, CargoKind, Dimensions, PackedItem};
    /// use truck_packer::types::Vec3;
    ///
    /// let truck = Dimensions { length: 2.0, width: 2.0, height: 2.0 };
    /// let unit = Dimensions { length: 1.0, width: 1.0, height: 1.0 };
    /// let packed = vec![PackedItem::new(
    ///     CargoItem::new("a", CargoKind::Custom, unit).unwrap(),
    ///     Vec3::zero(),
    /// )];
    /// let metrics = LoadMetrics::from_packed(&truck, &packed);
    /// assert_eq!(metrics.utilization_label(), "12.5");
    /// ```
    pub fn from_packed(truck: &TruckConfig, packed: &[PackedItem]) -> Self {
        let total_volume = truck.volume();
        let packed_volume: f64 = packed.iter().map(|p| p.volume()).sum();
        let utilization_percent = if total_volume > 0.0 {
            round_to_tenth(packed_volume / total_volume * 100.0)
        } else {
            0.0
        };

        Self {
            total_volume,
            packed_volume,
            available_volume: total_volume - packed_volume,
            utilization_percent,
        }
    }

    /// Utilization with exactly one decimal, e.g. `"12.5"`.
    pub fn utilization_label(&self) -> String {
        format!("{:.1}", self.utilization_percent)
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
