//! Post-pack weight redistribution: given a solution set of packed cartons,
//! move items between pairs to even out the weight, repacking to prove every
//! move still fits.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::carton::{Carton, CartonList};
use crate::config::PackerConfig;
use crate::error::Result;
use crate::item::{Item, ItemList};
use crate::model::{PackedCarton, PackedCartonList, PackedItemList};
use crate::packer::{CartonKey, Packer};
use crate::sort::PackedCartonSorter;
use crate::timeout::TimeoutChecker;

pub struct WeightRedistributor<'a> {
    cartons: CartonList,
    sorter: Rc<dyn PackedCartonSorter>,
    quantities: &'a mut HashMap<CartonKey, u32>,
    timeout: Option<&'a TimeoutChecker>,
}

impl<'a> WeightRedistributor<'a> {
    pub(crate) fn new(
        cartons: CartonList,
        sorter: Rc<dyn PackedCartonSorter>,
        quantities: &'a mut HashMap<CartonKey, u32>,
        timeout: Option<&'a TimeoutChecker>,
    ) -> Self {
        Self {
            cartons,
            sorter,
            quantities,
            timeout,
        }
    }

    /// Repack the given cartons towards an even weight distribution. Any
    /// successful move restarts the scan; terminates when a full pass makes
    /// no progress.
    pub fn redistribute(&mut self, original: PackedCartonList) -> Result<PackedCartonList> {
        let target_weight = original.mean_item_weight();

        let mut cartons: Vec<PackedCarton> = original.into_vec();
        cartons.sort_by(|a, b| b.weight().cmp(&a.weight()));

        let mut iteration_successful = true;
        while iteration_successful {
            iteration_successful = false;
            'pairs: for a in 0..cartons.len() {
                for b in (a + 1)..cartons.len() {
                    if cartons[a].weight() == cartons[b].weight() {
                        continue; // no need to evaluate
                    }
                    if self.equalise_weight(&mut cartons, a, b, target_weight)? {
                        cartons.retain(|c| !c.items.is_empty());
                        iteration_successful = true;
                        break 'pairs;
                    }
                }
            }
        }

        let mut result = PackedCartonList::with_sorter(Rc::clone(&self.sorter));
        for carton in cartons {
            result.insert(carton);
        }
        Ok(result)
    }

    /// Try to move one item between the pair at `a`/`b`. A move commits only
    /// when the lighter side still repacks into a single carton, the pair
    /// variance strictly decreases, and the heavier side's remaining items
    /// also still repack into a single carton (or the heavier side is now
    /// empty, eliminating it).
    fn equalise_weight(
        &mut self,
        cartons: &mut [PackedCarton],
        a: usize,
        b: usize,
        target_weight: f64,
    ) -> Result<bool> {
        let (over_idx, under_idx) = if cartons[a].weight() > cartons[b].weight() {
            (a, b)
        } else {
            (b, a)
        };
        let over_carton = Rc::clone(&cartons[over_idx].carton);
        let under_carton = Rc::clone(&cartons[under_idx].carton);
        let over_items = cartons[over_idx].items.as_item_vec();
        let under_items = cartons[under_idx].items.as_item_vec();

        for (index, over_item) in over_items.iter().enumerate() {
            if let Some(timeout) = self.timeout {
                timeout.check()?;
            }

            if !would_repack_actually_help(&over_items, over_item, &under_items, target_weight) {
                continue; // moving this item would harm more than help
            }

            let mut trial_under = under_items.clone();
            trial_under.push(Rc::clone(over_item));
            let lighter = self.volume_repack(&trial_under, &under_carton)?;
            if lighter.len() != 1 {
                continue; // only move the item if it still fits a single carton
            }

            if over_items.len() == 1 {
                // a repack can be efficient enough to eliminate a carton
                let lighter_carton = into_single(lighter);
                debug!(
                    eliminated = %over_carton.reference,
                    into = %lighter_carton.carton.reference,
                    "redistribution emptied a carton"
                );
                self.adjust_quantity(&under_carton, -1);
                self.adjust_quantity(&over_carton, 1);
                cartons[under_idx] = lighter_carton;
                cartons[over_idx].items = PackedItemList::new();
                return Ok(true);
            }

            let trial_over: Vec<Rc<Item>> = over_items
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != index)
                .map(|(_, item)| Rc::clone(item))
                .collect();
            let heavier = self.volume_repack(&trial_over, &over_carton)?;
            if heavier.len() != 1 {
                continue;
            }

            let lighter_carton = into_single(lighter);
            let heavier_carton = into_single(heavier);
            debug!(
                item = %over_item.description,
                from = %over_carton.reference,
                to = %under_carton.reference,
                "redistribution moved an item"
            );
            self.adjust_quantity(&over_carton, 1);
            self.adjust_quantity(&under_carton, 1);
            self.adjust_quantity(&heavier_carton.carton, -1);
            self.adjust_quantity(&lighter_carton.carton, -1);
            cartons[over_idx] = heavier_carton;
            cartons[under_idx] = lighter_carton;
            return Ok(true);
        }

        Ok(false)
    }

    /// Repack a set of items, requiring everything to land in one carton.
    /// Runs against the full catalogue so a smaller or larger carton can be
    /// chosen for efficiency, with the carton being vacated temporarily
    /// available again.
    fn volume_repack(
        &mut self,
        items: &[Rc<Item>],
        current_carton: &Rc<Carton>,
    ) -> Result<PackedCartonList> {
        let config = PackerConfig {
            throw_on_unpackable_item: false,
            ..PackerConfig::default()
        };
        let mut packer = Packer::with_config(config);
        packer.set_packed_carton_sorter(Rc::clone(&self.sorter));
        packer.set_cartons(self.cartons.clone());

        let catalogue: Vec<Rc<Carton>> = self.cartons.iter().cloned().collect();
        for carton in &catalogue {
            let quantity = self.quantity(carton);
            packer.set_carton_quantity(carton, quantity);
        }
        packer.set_carton_quantity(current_carton, self.quantity(current_carton).saturating_add(1));

        let mut item_list = ItemList::new();
        for item in items {
            item_list.insert(Rc::clone(item), 1);
        }
        packer.set_items(item_list);

        packer.basic_packing(true, None)
    }

    fn quantity(&self, carton: &Rc<Carton>) -> u32 {
        self.quantities
            .get(&CartonKey(Rc::clone(carton)))
            .copied()
            .unwrap_or(0)
    }

    fn adjust_quantity(&mut self, carton: &Rc<Carton>, delta: i32) {
        let entry = self
            .quantities
            .entry(CartonKey(Rc::clone(carton)))
            .or_insert(0);
        *entry = if delta >= 0 {
            entry.saturating_add(delta as u32)
        } else {
            entry.saturating_sub(delta.unsigned_abs())
        };
    }
}

fn into_single(mut list: PackedCartonList) -> PackedCarton {
    list.iter().next().cloned().expect("exactly one carton")
}

/// Not every attempted repack is actually helpful: the move must bring the
/// lighter side no further than the target and strictly shrink the pair
/// variance.
fn would_repack_actually_help(
    over_items: &[Rc<Item>],
    over_item: &Rc<Item>,
    under_items: &[Rc<Item>],
    target_weight: f64,
) -> bool {
    let over_weight: u64 = over_items.iter().map(|i| i.weight as u64).sum();
    let under_weight: u64 = under_items.iter().map(|i| i.weight as u64).sum();

    if (over_item.weight as u64 + under_weight) as f64 > target_weight {
        return false;
    }

    let old_variance = pair_variance(over_weight, under_weight);
    let new_variance = pair_variance(
        over_weight - over_item.weight as u64,
        under_weight + over_item.weight as u64,
    );
    new_variance < old_variance
}

/// Variance of a two-carton population: the difference from the mean is the
/// same magnitude on each side, so a single squared deviation suffices. An
/// N-way redistribution would need the full sum of squares over N.
fn pair_variance(a_weight: u64, b_weight: u64) -> f64 {
    let mean = (a_weight + b_weight) as f64 / 2.0;
    let diff = a_weight as f64 - mean;
    diff * diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Rotation;
    use crate::sort::DefaultPackedCartonSorter;

    #[test]
    fn redistribution_of_its_own_output_changes_nothing() {
        let carton = Rc::new(Carton::new("twin", 22, 12, 12, 0, 20, 10, 10, 600).with_quantity(2));
        let mut packer = Packer::new();
        packer.add_carton(Rc::clone(&carton));
        packer.add_item(Item::new("anvil", 10, 10, 10, 400, Rotation::BestFit), 1);
        packer.add_item(Item::new("pillow", 10, 10, 10, 100, Rotation::BestFit), 3);

        let packed = packer.pack().expect("packable");
        let variance_once = packed.weight_variance();

        let mut quantities = HashMap::new();
        quantities.insert(CartonKey(Rc::clone(&carton)), 0);
        let mut catalogue = CartonList::new();
        catalogue.insert(Rc::clone(&carton));
        let mut redistributor = WeightRedistributor::new(
            catalogue,
            Rc::new(DefaultPackedCartonSorter),
            &mut quantities,
            None,
        );

        let packed_again = redistributor.redistribute(packed).expect("no timeout");
        assert_eq!(packed_again.weight_variance(), variance_once);
    }

    #[test]
    fn pair_variance_shrinks_as_weights_converge() {
        assert!(pair_variance(400, 300) < pair_variance(500, 200));
        assert_eq!(pair_variance(350, 350), 0.0);
    }

    #[test]
    fn unhelpful_moves_are_rejected() {
        let heavy = Rc::new(Item::new("heavy", 10, 10, 10, 400, crate::item::Rotation::BestFit));
        let light = Rc::new(Item::new("light", 10, 10, 10, 100, crate::item::Rotation::BestFit));
        let over = vec![Rc::clone(&heavy), Rc::clone(&light)];
        let under = vec![Rc::clone(&light), Rc::clone(&light)];

        // moving the 400g item would overshoot the 350g target
        assert!(!would_repack_actually_help(&over, &heavy, &under, 350.0));
        // moving a 100g item converges on it
        assert!(would_repack_actually_help(&over, &light, &under, 350.0));
    }
}
