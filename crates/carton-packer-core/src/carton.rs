use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::sort::{CartonSorter, DefaultCartonSorter};

/// A carton (or envelope) to pack items into. Dimensions are mm, weights g.
///
/// `inner_*` must not exceed the corresponding `outer_*`; `max_weight` is the
/// maximum gross weight the packaging can hold, including its own
/// `empty_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carton {
    /// Reference for the carton type (e.g. SKU or description).
    pub reference: String,
    pub outer_width: u32,
    pub outer_length: u32,
    pub outer_depth: u32,
    pub empty_weight: u32,
    pub inner_width: u32,
    pub inner_length: u32,
    pub inner_depth: u32,
    pub max_weight: u32,
    /// Quantity of this carton type available; `None` means unbounded.
    #[serde(default)]
    pub quantity_available: Option<u32>,
    #[serde(skip)]
    working_volume: bool,
}

impl Carton {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: impl Into<String>,
        outer_width: u32,
        outer_length: u32,
        outer_depth: u32,
        empty_weight: u32,
        inner_width: u32,
        inner_length: u32,
        inner_depth: u32,
        max_weight: u32,
    ) -> Self {
        Self {
            reference: reference.into(),
            outer_width,
            outer_length,
            outer_depth,
            empty_weight,
            inner_width,
            inner_length,
            inner_depth,
            max_weight,
            quantity_available: None,
            working_volume: false,
        }
    }

    /// Limit the available supply of this carton type.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity_available = Some(quantity);
        self
    }

    /// Synthetic volume used internally for lookahead simulation: inner and
    /// outer dimensions coincide, it weighs nothing and holds anything, and
    /// placement constraint hooks are not consulted inside it.
    pub(crate) fn working_volume(width: u32, length: u32, depth: u32) -> Self {
        Self {
            reference: format!("Working Volume {width}x{length}x{depth}"),
            outer_width: width,
            outer_length: length,
            outer_depth: depth,
            empty_weight: 0,
            inner_width: width,
            inner_length: length,
            inner_depth: depth,
            max_weight: u32::MAX,
            quantity_available: None,
            working_volume: true,
        }
    }

    pub fn inner_volume(&self) -> u64 {
        self.inner_width as u64 * self.inner_length as u64 * self.inner_depth as u64
    }

    pub(crate) fn is_working_volume(&self) -> bool {
        self.working_volume
    }
}

/// List of cartons available to put items into, ordered by the configured
/// carton sorter (smallest first by default).
#[derive(Clone)]
pub struct CartonList {
    cartons: Vec<Rc<Carton>>,
    is_sorted: bool,
    sorter: Rc<dyn CartonSorter>,
}

impl CartonList {
    pub fn new() -> Self {
        Self::with_sorter(Rc::new(DefaultCartonSorter))
    }

    pub fn with_sorter(sorter: Rc<dyn CartonSorter>) -> Self {
        Self {
            cartons: Vec::new(),
            is_sorted: false,
            sorter,
        }
    }

    pub fn from_vec(cartons: Vec<Rc<Carton>>, pre_sorted: bool) -> Self {
        Self {
            cartons,
            is_sorted: pre_sorted,
            sorter: Rc::new(DefaultCartonSorter),
        }
    }

    pub fn insert(&mut self, carton: impl Into<Rc<Carton>>) {
        self.cartons.push(carton.into());
        self.is_sorted = false;
    }

    /// Iterate in catalogue order (smallest first by default).
    pub fn iter(&mut self) -> impl Iterator<Item = &Rc<Carton>> {
        if !self.is_sorted {
            let sorter = Rc::clone(&self.sorter);
            self.cartons.sort_by(|a, b| sorter.compare(a, b));
            self.is_sorted = true;
        }
        self.cartons.iter()
    }

    pub fn len(&self) -> usize {
        self.cartons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cartons.is_empty()
    }
}

impl Default for CartonList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CartonList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cartons.iter()).finish()
    }
}
