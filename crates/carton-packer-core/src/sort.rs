//! Sorter seams: the engine takes its packing priorities through these
//! traits, and callers may replace any of them.

use std::cmp::Ordering;

use crate::carton::Carton;
use crate::item::Item;
use crate::model::PackedCarton;

/// Decides which item is a higher priority for packing.
/// `Ordering::Less` means `a` is packed first.
pub trait ItemSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering;
}

/// Decides which carton to try first. `Ordering::Less` means `a` is tried first.
pub trait CartonSorter {
    fn compare(&self, a: &Carton, b: &Carton) -> Ordering;
}

/// Decides which packed carton is "better". `Ordering::Less` means `a` wins.
pub trait PackedCartonSorter {
    fn compare(&self, a: &PackedCarton, b: &PackedCarton) -> Ordering;
}

/// Largest, heaviest items first; alphabetical as the final tiebreaker.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultItemSorter;

impl ItemSorter for DefaultItemSorter {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        b.volume()
            .cmp(&a.volume())
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| a.description.cmp(&b.description))
    }
}

/// Smallest carton first: inner volume, then empty weight, then weight
/// capacity as the fallback decider.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCartonSorter;

impl CartonSorter for DefaultCartonSorter {
    fn compare(&self, a: &Carton, b: &Carton) -> Ordering {
        a.inner_volume()
            .cmp(&b.inner_volume())
            .then_with(|| a.empty_weight.cmp(&b.empty_weight))
            .then_with(|| {
                let a_capacity = a.max_weight.saturating_sub(a.empty_weight);
                let b_capacity = b.max_weight.saturating_sub(b.empty_weight);
                a_capacity.cmp(&b_capacity)
            })
    }
}

/// Fullest carton first: item count, then volume utilisation, then used volume.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPackedCartonSorter;

impl PackedCartonSorter for DefaultPackedCartonSorter {
    fn compare(&self, a: &PackedCarton, b: &PackedCarton) -> Ordering {
        b.items
            .len()
            .cmp(&a.items.len())
            .then_with(|| {
                b.volume_utilisation()
                    .partial_cmp(&a.volume_utilisation())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| b.used_volume().cmp(&a.used_volume()))
    }
}
