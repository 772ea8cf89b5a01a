//! Data models for the cargo-bay packing engine.
//!
//! This module defines the fundamental data structures:
//! - `Dimensions` / `TruckConfig`: the extent of a box or of the cargo bay
//! - `CargoItem`: a box waiting to be loaded
//! - `PackedItem`: a cargo item together with the corner it was placed at
//!
//! All structures implement the traits from the `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Positioned, Vec3, validation};

/// Validation error for cargo and truck data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Extent of a box in meters.
///
/// Componentwise comparisons use the order `(length, width, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "length": 1.2, "width": 0.8, "height": 1.0 }))]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// The cargo bay envelope of a vehicle.
pub type TruckConfig = Dimensions;

impl Dimensions {
    /// Creates validated dimensions.
    ///
    /// # Examples
    /// ```
    /// use truck_packer::model::Dimensions;
    ///
    /// assert!(Dimensions::new(1.2, 0.8, 1.0).is_ok());
    /// assert!(Dimensions::new(0.0, 0.8, 1.0).is_err());
    /// ```
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        let dims = Self {
            length,
            width,
            height,
        };
        dims.validate("")?;
        Ok(dims)
    }

    /// Checks that every dimension is positive and finite.
    ///
    /// `subject` prefixes the field names in the error text (e.g. "Truck").
    pub fn validate(&self, subject: &str) -> Result<(), ValidationError> {
        let label = |field: &str| {
            if subject.is_empty() {
                field.to_string()
            } else {
                format!("{} {}", subject, field.to_ascii_lowercase())
            }
        };
        validation::validate_dimension(self.length, &label("Length"))
            .and_then(|_| validation::validate_dimension(self.width, &label("Width")))
            .and_then(|_| validation::validate_dimension(self.height, &label("Height")))
            .map_err(ValidationError::InvalidDimension)
    }

    /// Converts the dimensions to a Vec3 `(length, width, height)`.
    #[inline]
    pub const fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

impl Dimensional for Dimensions {
    fn extent(&self) -> Vec3 {
        self.as_vec3()
    }
}

/// Origin of a cargo item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CargoKind {
    /// Preset package size picked from a catalogue.
    Standard,
    /// Dimensions entered by hand or decoded from a label.
    #[default]
    Custom,
}

fn default_color() -> String {
    CargoItem::DEFAULT_COLOR.to_string()
}

/// A box waiting to be loaded.
///
/// # Fields
/// * `id` - Unique identifier supplied by the producer of the item
/// * `kind` - `standard` or `custom`, serialized as `type`
/// * `dims` - Extent in meters
/// * `color` - Display color for viewers
/// * `name` - Optional display name
/// * `delivery_stop` - Optional stop ordinal; carried through but never used for placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "pallet-1",
    "type": "standard",
    "dims": { "length": 1.2, "width": 0.8, "height": 1.0 },
    "color": "#4f8cff",
    "name": "Euro pallet",
    "delivery_stop": 2
}))]
pub struct CargoItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: CargoKind,
    pub dims: Dimensions,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stop: Option<u32>,
}

impl CargoItem {
    pub const DEFAULT_COLOR: &'static str = "#4f8cff";

    /// Creates a cargo item with validation.
    ///
    /// # Returns
    /// `Ok(CargoItem)` for a non-empty id and valid dimensions, otherwise `Err(ValidationError)`
    ///
    /// # Examples
    /// ```
    /// use truck_packer::model::{CargoItem, CargoKind, Dimensions};
    ///
    /// let dims = Dimensions { length: 1.2, width: 0.8, height: 1.0 };
    /// assert!(CargoItem::new("a", CargoKind::Standard, dims).is_ok());
    /// assert!(CargoItem::new(" ", CargoKind::Standard, dims).is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        kind: CargoKind,
        dims: Dimensions,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id: id.into(),
            kind,
            dims,
            color: default_color(),
            name: None,
            delivery_stop: None,
        };
        item.validate()?;
        Ok(item)
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the delivery stop ordinal.
    pub fn with_delivery_stop(mut self, stop: u32) -> Self {
        self.delivery_stop = Some(stop);
        self
    }

    /// Checks the id and dimensions of an item that was built elsewhere
    /// (e.g. deserialized from a request).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidIdentifier(
                "Cargo id must not be empty".to_string(),
            ));
        }
        self.dims.validate("")
    }
}

impl Dimensional for CargoItem {
    fn extent(&self) -> Vec3 {
        self.dims.as_vec3()
    }
}

/// A cargo item with its position in the cargo bay.
///
/// # Fields
/// * `item` - The original cargo item
/// * `position` - Minimum corner of the box (not its center)
#[derive(Clone, Debug, PartialEq)]
pub struct PackedItem {
    pub item: CargoItem,
    pub position: Vec3,
}

impl PackedItem {
    /// Creates a new PackedItem.
    pub fn new(item: CargoItem, position: Vec3) -> Self {
        Self { item, position }
    }

    /// Id of the underlying cargo item.
    #[inline]
    pub fn id(&self) -> &str {
        &self.item.id
    }

    /// Returns a copy placed at another position; everything else is kept.
    pub fn moved_to(&self, position: Vec3) -> Self {
        Self {
            item: self.item.clone(),
            position,
        }
    }
}

impl Positioned for PackedItem {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl Dimensional for PackedItem {
    fn extent(&self) -> Vec3 {
        self.item.extent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(length: f64, width: f64, height: f64) -> Dimensions {
        Dimensions {
            length,
            width,
            height,
        }
    }

    #[test]
    fn dimensions_reject_non_positive_values() {
        assert!(Dimensions::new(1.0, 1.0, 1.0).is_ok());
        let err = Dimensions::new(1.0, -0.5, 1.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDimension("Width must be positive, got: -0.5".to_string())
        );
    }

    #[test]
    fn truck_validation_names_the_subject() {
        let truck: TruckConfig = dims(2.0, 0.0, 2.0);
        let err = truck.validate("Truck").unwrap_err();
        assert!(err.to_string().contains("Truck width"), "{}", err);
    }

    #[test]
    fn cargo_item_requires_id() {
        let err = CargoItem::new("", CargoKind::Custom, dims(1.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier(_)));
    }

    #[test]
    fn cargo_item_deserializes_with_defaults() {
        let json = r#"{ "id": "box-7", "dims": { "length": 0.4, "width": 0.3, "height": 0.2 } }"#;
        let item: CargoItem = serde_json::from_str(json).expect("valid cargo JSON");
        assert_eq!(item.kind, CargoKind::Custom);
        assert_eq!(item.color, CargoItem::DEFAULT_COLOR);
        assert_eq!(item.name, None);
        assert_eq!(item.delivery_stop, None);
        assert!((item.volume() - 0.024).abs() < 1e-12);
    }

    #[test]
    fn cargo_kind_uses_type_key() {
        let item = CargoItem::new("p", CargoKind::Standard, dims(1.2, 0.8, 1.0))
            .unwrap()
            .with_name("Euro pallet")
            .with_delivery_stop(3);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "standard");
        assert_eq!(value["delivery_stop"], 3);
        assert_eq!(value["name"], "Euro pallet");
    }

    #[test]
    fn moved_packed_item_keeps_cargo_data() {
        let item = CargoItem::new("a", CargoKind::Custom, dims(1.0, 2.0, 3.0))
            .unwrap()
            .with_color("#ff0000");
        let packed = PackedItem::new(item.clone(), Vec3::zero());
        let moved = packed.moved_to(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(moved.item, item);
        assert_eq!(moved.position(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(packed.position(), Vec3::zero());
        assert_eq!(moved.extent(), Vec3::new(1.0, 2.0, 3.0));
    }
}
