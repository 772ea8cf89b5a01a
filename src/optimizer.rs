//! Greedy placement of cargo boxes inside a single cargo bay.
//!
//! Boxes are processed largest first. Each box goes onto the lowest, rearmost,
//! leftmost anchor where it stays inside the truck and touches nothing with
//! positive volume. Boxes without such an anchor are reported as unpacked.
//! Orientation is taken as given; there is no rotation search.

use std::cmp::Ordering;

use serde::Serialize;

use crate::anchors::AnchorPool;
use crate::geometry::{fits_in_bounds, intersects};
use crate::model::{CargoItem, Dimensions, PackedItem, TruckConfig};
use crate::types::{Dimensional, EPSILON_BOUNDS, Positioned, Vec3};

/// Configuration for the packing algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Tolerance for the boundary containment check in meters
    pub bounds_epsilon: f64,
}

impl PackingConfig {
    pub const DEFAULT_BOUNDS_EPSILON: f64 = EPSILON_BOUNDS;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            bounds_epsilon: Self::DEFAULT_BOUNDS_EPSILON,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the containment tolerance.
    pub fn bounds_epsilon(mut self, epsilon: f64) -> Self {
        self.config.bounds_epsilon = epsilon;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Result of one packing run.
///
/// Both sequences follow the processing order (volume descending, stable),
/// not the order in which the cargo was handed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackingResult {
    pub packed: Vec<PackedItem>,
    pub unpacked: Vec<CargoItem>,
}

impl PackingResult {
    /// Indicates whether every item was placed.
    pub fn is_complete(&self) -> bool {
        self.unpacked.is_empty()
    }

    /// Number of placed items.
    pub fn packed_count(&self) -> usize {
        self.packed.len()
    }

    /// Number of items left out.
    pub fn unpacked_count(&self) -> usize {
        self.unpacked.len()
    }
}

/// Why an item ended up in the unpacked list.
///
/// Not an error: the user is told to reduce the cargo or pick a larger truck.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnpackedReason {
    NoRemainingSpace,
}

impl UnpackedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnpackedReason::NoRemainingSpace => "no_remaining_space",
        }
    }
}

impl std::fmt::Display for UnpackedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnpackedReason::NoRemainingSpace => write!(
                f,
                "No remaining space in the cargo bay. Reduce the cargo or use a larger truck."
            ),
        }
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// An item was placed.
    ItemPlaced {
        id: String,
        pos: (f64, f64, f64),
        dims: Dimensions,
        packed_count: usize,
    },
    /// An item found no anchor.
    ItemUnpacked {
        id: String,
        dims: Dimensions,
        reason_code: String,
        reason_text: String,
    },
    /// Packing finished.
    Finished { packed: usize, unpacked: usize },
}

/// Packs cargo into the truck with the default configuration.
///
/// # Examples
/// ```
/// use truck_packer::model::{CargoItem, CargoKind, Dimensions};
/// use truck_packer::optimizer::pack_cargo;
///
/// let cube = Dimensions { length: 1.2, width: 1.2, height: 1.2 };
/// let truck = Dimensions { length: 2.4, width: 1.2, height: 1.2 };
/// let cargo = vec![
///     CargoItem::new("a", CargoKind::Standard, cube).unwrap(),
///     CargoItem::new("b", CargoKind::Standard, cube).unwrap(),
/// ];
/// let result = pack_cargo(&truck, cargo);
/// assert!(result.is_complete());
/// assert_eq!(result.packed[1].position.x, 1.2);
/// ```
pub fn pack_cargo(truck: &TruckConfig, cargo: Vec<CargoItem>) -> PackingResult {
    pack_cargo_with_config(truck, cargo, PackingConfig::default())
}

/// Like `pack_cargo`, with adjustable parameters.
pub fn pack_cargo_with_config(
    truck: &TruckConfig,
    cargo: Vec<CargoItem>,
    config: PackingConfig,
) -> PackingResult {
    pack_cargo_with_progress(truck, cargo, config, |_| {})
}

/// Packing with a live progress callback.
///
/// Calls `on_event` once per item in processing order and once at the end.
pub fn pack_cargo_with_progress(
    truck: &TruckConfig,
    cargo: Vec<CargoItem>,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackingResult {
    // Large items first; `sort_by` is stable, so equal volumes keep input order.
    let mut items = cargo;
    items.sort_by(|a, b| {
        b.volume()
            .partial_cmp(&a.volume())
            .unwrap_or(Ordering::Equal)
    });

    let truck_extent = truck.as_vec3();
    let mut anchors = AnchorPool::new();
    let mut packed: Vec<PackedItem> = Vec::new();
    let mut unpacked: Vec<CargoItem> = Vec::new();

    for item in items {
        match find_anchor(&item, &anchors, &packed, truck_extent, &config) {
            Some(anchor) => {
                anchors.consume(&anchor);
                anchors.propose(anchor, &item.dims, truck);
                packed.push(PackedItem::new(item, anchor));

                if let Some(placed) = packed.last() {
                    on_event(&PackEvent::ItemPlaced {
                        id: placed.item.id.clone(),
                        pos: placed.position.as_tuple(),
                        dims: placed.item.dims,
                        packed_count: packed.len(),
                    });
                }
            }
            None => {
                let reason = UnpackedReason::NoRemainingSpace;
                on_event(&PackEvent::ItemUnpacked {
                    id: item.id.clone(),
                    dims: item.dims,
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                unpacked.push(item);
            }
        }
    }

    on_event(&PackEvent::Finished {
        packed: packed.len(),
        unpacked: unpacked.len(),
    });
    PackingResult { packed, unpacked }
}

/// Finds the first anchor (bottom, back, left) where the item can go.
///
/// # Returns
/// `Some(anchor)` if the box fits the truck there without overlapping any
/// packed box, otherwise `None`
fn find_anchor(
    item: &CargoItem,
    anchors: &AnchorPool,
    packed: &[PackedItem],
    truck: Vec3,
    config: &PackingConfig,
) -> Option<Vec3> {
    let extent = item.extent();

    anchors.ordered().into_iter().find(|&anchor| {
        fits_in_bounds(anchor, extent, truck, config.bounds_epsilon)
            && !packed
                .iter()
                .any(|p| intersects(anchor, extent, p.position(), p.extent()))
    })
}
