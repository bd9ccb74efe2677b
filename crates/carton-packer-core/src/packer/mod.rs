//! The packing engine, leaves first: orientation selection, layer packing,
//! volume packing, and the top-level multi-carton packer.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::carton::{Carton, CartonList};
use crate::config::PackerConfig;
use crate::error::{PackerError, Result};
use crate::item::{Item, ItemList};
use crate::model::{PackedCarton, PackedCartonList};
use crate::sort::{DefaultPackedCartonSorter, PackedCartonSorter};
use crate::timeout::TimeoutChecker;

pub mod layer;
pub mod orientation;
pub mod volume;
pub(crate) mod weight;

use orientation::LookaheadCache;
use volume::VolumePacker;
use weight::WeightRedistributor;

/// Quantity-ledger key: carton types are tracked by identity, matching the
/// handles the catalogue was built from.
#[derive(Debug, Clone)]
pub(crate) struct CartonKey(pub(crate) Rc<Carton>);

impl PartialEq for CartonKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CartonKey {}

impl Hash for CartonKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// The top-level packer: owns the item pool, the carton catalogue and the
/// remaining-quantity ledger, and drives a volume packer per candidate
/// carton until the pool is empty.
pub struct Packer {
    config: PackerConfig,
    items: ItemList,
    cartons: CartonList,
    quantities: HashMap<CartonKey, u32>,
    packed_carton_sorter: Rc<dyn PackedCartonSorter>,
    cache: Rc<RefCell<LookaheadCache>>,
}

impl Packer {
    pub fn new() -> Self {
        Self::with_config(PackerConfig::default())
    }

    pub fn with_config(config: PackerConfig) -> Self {
        Self {
            config,
            items: ItemList::new(),
            cartons: CartonList::new(),
            quantities: HashMap::new(),
            packed_carton_sorter: Rc::new(DefaultPackedCartonSorter),
            cache: Rc::new(RefCell::new(LookaheadCache::default())),
        }
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PackerConfig) {
        self.config = config;
    }

    /// Add an item to be packed, `quantity` times.
    pub fn add_item(&mut self, item: impl Into<Rc<Item>>, quantity: u32) {
        self.items.insert(item.into(), quantity);
    }

    /// Set the items to pack all at once.
    pub fn set_items(&mut self, items: ItemList) {
        self.items = items;
    }

    /// Add a carton type to the catalogue. Its `quantity_available` seeds
    /// the supply ledger; absent means effectively unbounded.
    pub fn add_carton(&mut self, carton: impl Into<Rc<Carton>>) {
        let carton = carton.into();
        let quantity = carton.quantity_available.unwrap_or(u32::MAX);
        self.quantities.insert(CartonKey(Rc::clone(&carton)), quantity);
        self.cartons.insert(carton);
    }

    /// Set the carton catalogue all at once.
    pub fn set_cartons(&mut self, mut cartons: CartonList) {
        self.quantities.clear();
        for carton in cartons.iter() {
            self.quantities.insert(
                CartonKey(Rc::clone(carton)),
                carton.quantity_available.unwrap_or(u32::MAX),
            );
        }
        self.cartons = cartons;
    }

    /// Override the remaining supply of a carton type.
    pub fn set_carton_quantity(&mut self, carton: &Rc<Carton>, quantity: u32) {
        self.quantities
            .insert(CartonKey(Rc::clone(carton)), quantity);
    }

    pub fn set_packed_carton_sorter(&mut self, sorter: Rc<dyn PackedCartonSorter>) {
        self.packed_carton_sorter = sorter;
    }

    /// The items that have not been packed (populated after a partial pack
    /// with `throw_on_unpackable_item` off).
    pub fn unpacked_items(&self) -> &ItemList {
        &self.items
    }

    /// Pack items into cartons using the built-in heuristics for the best
    /// solution, then even out the weight across the produced set.
    #[instrument(skip_all)]
    pub fn pack(&mut self) -> Result<PackedCartonList> {
        self.cache.borrow_mut().clear();
        if self.config.strict_item_ordering {
            self.items.mark_sorted();
        }
        let timeout = self.config.timeout.map(TimeoutChecker::new);

        let mut packed = self.basic_packing(false, timeout.as_ref())?;

        // with multiple cartons, try to optimise/even out weight distribution
        if !self.config.strict_item_ordering
            && packed.len() > 1
            && packed.len() <= self.config.max_cartons_to_balance_weight
        {
            let cartons = self.cartons.clone();
            let mut redistributor = WeightRedistributor::new(
                cartons,
                Rc::clone(&self.packed_carton_sorter),
                &mut self.quantities,
                timeout.as_ref(),
            );
            packed = redistributor.redistribute(packed)?;
        }

        Ok(packed)
    }

    /// One carton-selection sweep, without weight redistribution.
    pub(crate) fn basic_packing(
        &mut self,
        enforce_single_carton: bool,
        timeout: Option<&TimeoutChecker>,
    ) -> Result<PackedCartonList> {
        let mut packed_cartons =
            PackedCartonList::with_sorter(Rc::clone(&self.packed_carton_sorter));

        // keep going until everything is packed
        while !self.items.is_empty() {
            let mut iteration: Vec<PackedCarton> = Vec::new();
            let remaining_count = self.items.len();

            // loop through cartons starting with the smallest, see what happens
            for carton in self.carton_candidates(enforce_single_carton) {
                if let Some(timeout) = timeout {
                    timeout.check()?;
                }

                let mut volume_packer =
                    VolumePacker::new(carton, &mut self.items, Rc::clone(&self.cache));
                volume_packer.set_strict_item_ordering(self.config.strict_item_ordering);
                let packed = volume_packer.pack();

                if !packed.items.is_empty() {
                    let complete = packed.items.len() == remaining_count;
                    iteration.push(packed);
                    // have we found a single carton that contains everything?
                    if complete {
                        break;
                    }
                }
            }

            if !iteration.is_empty() {
                // find the best carton of the iteration and remove its items
                // from the pool
                iteration.sort_by(|a, b| self.packed_carton_sorter.compare(a, b));
                let best = iteration.into_iter().next().expect("non-empty iteration");
                debug!(
                    carton = %best.carton.reference,
                    items = best.items.len(),
                    "selected best carton of iteration"
                );

                self.items.remove_packed(&best.items);
                if let Some(quantity) = self
                    .quantities
                    .get_mut(&CartonKey(Rc::clone(&best.carton)))
                {
                    *quantity = quantity.saturating_sub(1);
                }
                packed_cartons.insert(best);
            } else if self.config.throw_on_unpackable_item {
                let message = match self.items.top() {
                    Some(top) => {
                        format!("No cartons could be found for item '{}'", top.description)
                    }
                    None => String::from("No cartons could be found for items"),
                };
                return Err(PackerError::NoCartonsAvailable {
                    message,
                    items: self.items.clone(),
                });
            } else {
                warn!(
                    remaining = self.items.len(),
                    "no carton accepted any remaining item, returning partial result"
                );
                break;
            }
        }

        Ok(packed_cartons)
    }

    /// Pack items into cartons, returning every complete carton combination
    /// found by a DFS over carton choices. Use with caution (this will be
    /// slow) with a large number of carton types.
    pub fn pack_all_permutations(&mut self) -> Result<Vec<PackedCartonList>> {
        self.cache.borrow_mut().clear();
        if self.config.strict_item_ordering {
            self.items.mark_sorted();
        }
        let timeout = self.config.timeout.map(TimeoutChecker::new);

        struct WipPermutation {
            permutation: PackedCartonList,
            items_left: ItemList,
        }

        let mut wip = vec![WipPermutation {
            permutation: PackedCartonList::with_sorter(Rc::clone(&self.packed_carton_sorter)),
            items_left: self.items.clone(),
        }];
        let mut completed: Vec<PackedCartonList> = Vec::new();

        while let Some(mut wip_permutation) = wip.pop() {
            if wip_permutation.items_left.is_empty() {
                completed.push(wip_permutation.permutation);
                continue;
            }

            let mut remaining_quantities = self.quantities.clone();
            for packed in wip_permutation.permutation.iter() {
                if let Some(quantity) =
                    remaining_quantities.get_mut(&CartonKey(Rc::clone(&packed.carton)))
                {
                    *quantity = quantity.saturating_sub(1);
                }
            }

            let catalogue: Vec<Rc<Carton>> = self.cartons.iter().cloned().collect();
            let mut branches: Vec<PackedCarton> = Vec::new();
            for carton in catalogue {
                if let Some(timeout) = timeout.as_ref() {
                    timeout.check()?;
                }
                let available = remaining_quantities
                    .get(&CartonKey(Rc::clone(&carton)))
                    .copied()
                    .unwrap_or(0);
                if available == 0 {
                    continue;
                }

                let mut volume_packer = VolumePacker::new(
                    carton,
                    &mut wip_permutation.items_left,
                    Rc::clone(&self.cache),
                );
                let packed = volume_packer.pack();
                if !packed.items.is_empty() {
                    branches.push(packed);
                }
            }

            if !branches.is_empty() {
                for branch in branches {
                    let mut permutation =
                        PackedCartonList::with_sorter(Rc::clone(&self.packed_carton_sorter));
                    for packed in wip_permutation.permutation.iter() {
                        permutation.insert(packed.clone());
                    }
                    let mut items_left = wip_permutation.items_left.clone();
                    items_left.remove_packed(&branch.items);
                    permutation.insert(branch);
                    wip.push(WipPermutation {
                        permutation,
                        items_left,
                    });
                }
            } else if self.config.throw_on_unpackable_item {
                let message = match wip_permutation.items_left.top() {
                    Some(top) => {
                        format!("No cartons could be found for item '{}'", top.description)
                    }
                    None => String::from("No cartons could be found for items"),
                };
                return Err(PackerError::NoCartonsAvailable {
                    message,
                    items: wip_permutation.items_left.clone(),
                });
            } else if !wip_permutation.permutation.is_empty() {
                // don't treat the initial empty permutation as completed
                completed.push(wip_permutation.permutation);
            }
        }

        for permutation in &mut completed {
            for packed in permutation.iter() {
                self.items.remove_packed(&packed.items);
            }
        }

        Ok(completed)
    }

    /// A "smart" ordering of the cartons to try packing items into: those
    /// large enough to hold everything left come first, in catalogue order.
    fn carton_candidates(&mut self, enforce_single_carton: bool) -> Vec<Rc<Carton>> {
        let item_volume = self.items.total_volume();

        let quantities = &self.quantities;
        let mut preferred = Vec::new();
        let mut others = Vec::new();
        for carton in self.cartons.iter() {
            let available = quantities
                .get(&CartonKey(Rc::clone(carton)))
                .copied()
                .unwrap_or(0);
            if available == 0 {
                continue;
            }
            if carton.inner_volume() >= item_volume {
                preferred.push(Rc::clone(carton));
            } else if !enforce_single_carton {
                others.push(Rc::clone(carton));
            }
        }

        preferred.extend(others);
        preferred
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}
