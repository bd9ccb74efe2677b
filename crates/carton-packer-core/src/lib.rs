//! Core library for 3D bin packing of physical items into shipping cartons.
//!
//! - Engine: a layered constructive heuristic with forward lookahead —
//!   orientation selection, row-major layer packing with stacking and
//!   back-fill, carton-level search over rotations and first-item seeds,
//!   multi-carton selection with supply limits, weight redistribution
//! - Constraints: per-item rotation policies (never / keep flat / best fit),
//!   load stability, weight limits, optional caller-defined placement hooks
//! - Results are concrete placements (x, y, z and chosen orientation per
//!   item), deterministic for identical inputs
//!
//! Quick example:
//! ```
//! use carton_packer_core::{Carton, Item, Packer, Rotation};
//!
//! let mut packer = Packer::new();
//! packer.add_item(Item::new("deck of cards", 64, 89, 19, 100, Rotation::BestFit), 2);
//! packer.add_carton(Carton::new("small box", 110, 110, 50, 20, 100, 100, 40, 1000));
//!
//! let mut packed = packer.pack()?;
//! for carton in packed.iter() {
//!     println!("{}: {}% full", carton.carton.reference, carton.volume_utilisation());
//! }
//! # Ok::<(), carton_packer_core::PackerError>(())
//! ```

pub mod carton;
pub mod config;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod item;
pub mod model;
pub mod packer;
pub mod sort;
pub mod timeout;

pub use carton::{Carton, CartonList};
pub use config::{PackerConfig, PackerConfigBuilder};
pub use error::{PackerError, Result};
pub use item::{Item, ItemList, PlacementConstraint, Rotation};
pub use model::{PackedCarton, PackedCartonList, PackedItem, PackedItemList, PackedLayer};
pub use packer::layer::LayerPacker;
pub use packer::orientation::{LookaheadCache, OrientatedItem, OrientatedItemFactory};
pub use packer::volume::{LayerStabiliser, VolumePacker};
pub use packer::Packer;
pub use sort::{
    CartonSorter, DefaultCartonSorter, DefaultItemSorter, DefaultPackedCartonSorter, ItemSorter,
    PackedCartonSorter,
};
pub use timeout::TimeoutChecker;

/// Convenience prelude for common types.
/// Importing `carton_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::carton::{Carton, CartonList};
    pub use crate::config::{PackerConfig, PackerConfigBuilder};
    pub use crate::error::{PackerError, Result};
    pub use crate::item::{Item, ItemList, PlacementConstraint, Rotation};
    pub use crate::model::{PackedCarton, PackedCartonList, PackedItem};
    pub use crate::packer::Packer;
}
