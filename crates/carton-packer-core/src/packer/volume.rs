//! Packs a single carton: composes layers, trying the carton both ways
//! round and seeding with every usable first-item orientation, then
//! stabilises the result and fills end gaps.

use std::cell::RefCell;
use std::rc::Rc;

use crate::carton::Carton;
use crate::item::ItemList;
use crate::model::{PackedCarton, PackedItem, PackedItemList, PackedLayer};
use crate::packer::layer::LayerPacker;
use crate::packer::orientation::{LookaheadCache, OrientatedItem, OrientatedItemFactory};

pub struct VolumePacker {
    carton: Rc<Carton>,
    items: ItemList,
    single_pass_mode: bool,
    pack_across_width_only: bool,
    strict_item_ordering: bool,
    has_constrained_items: bool,
    has_no_rotation_items: bool,
    layer_packer: LayerPacker,
    cache: Rc<RefCell<LookaheadCache>>,
}

impl VolumePacker {
    pub fn new(
        carton: Rc<Carton>,
        items: &mut ItemList,
        cache: Rc<RefCell<LookaheadCache>>,
    ) -> Self {
        let items = items.clone_sorted();
        let has_constrained_items = items.has_constrained_items();
        let has_no_rotation_items = items.has_no_rotation_items();
        let layer_packer = LayerPacker::new(Rc::clone(&carton), Rc::clone(&cache));

        Self {
            carton,
            items,
            single_pass_mode: false,
            pack_across_width_only: false,
            strict_item_ordering: false,
            has_constrained_items,
            has_no_rotation_items,
            layer_packer,
            cache,
        }
    }

    /// Skip the carton-rotation half of the outer search.
    pub fn pack_across_width_only(&mut self) {
        self.pack_across_width_only = true;
    }

    pub fn set_strict_item_ordering(&mut self, strict: bool) {
        self.strict_item_ordering = strict;
        self.layer_packer.set_strict_item_ordering(strict);
    }

    /// Single-pass mode bounds the cost of lookahead recursion: no carton
    /// rotation, no first-item seeding, no stabilisation or gap fills.
    pub fn set_single_pass_mode(&mut self, single_pass_mode: bool) {
        self.single_pass_mode = single_pass_mode;
        if single_pass_mode {
            self.pack_across_width_only = true;
        }
        self.layer_packer.set_single_pass_mode(single_pass_mode);
    }

    /// Pack as many items as possible into this carton.
    pub fn pack(&mut self) -> PackedCarton {
        // "space available" decisions sometimes depend on the orientation of
        // the carton itself, so try both ways round
        let mut rotations = vec![false];
        if !self.pack_across_width_only && !self.has_no_rotation_items {
            rotations.push(true);
        }

        let mut seed_factory = OrientatedItemFactory::new(Rc::clone(&self.carton));
        let mut best: Option<PackedCarton> = None;

        for rotated in rotations {
            let (carton_width, carton_length) = if rotated {
                (self.carton.inner_length, self.carton.inner_width)
            } else {
                (self.carton.inner_width, self.carton.inner_length)
            };

            // The orientation of the first item can have an outsized effect
            // on the rest of the placement, so try each usable one as a seed.
            let mut seeds: Vec<Option<OrientatedItem>> = vec![None];
            if !self.single_pass_mode {
                if let Some(top) = self.items.top().cloned() {
                    let mut rest = self.items.clone();
                    rest.extract();
                    let sorted = seed_factory.sorted_orientations(
                        &top,
                        None,
                        &rest,
                        carton_width,
                        carton_length,
                        self.carton.inner_depth,
                        0,
                        0,
                        0,
                        0,
                        &PackedItemList::new(),
                        true,
                        &self.cache,
                    );
                    if !sorted.is_empty() {
                        seeds = sorted.into_iter().map(Some).collect();
                    }
                }
            }

            for first_item in seeds {
                let packed = self.pack_rotation(carton_width, carton_length, first_item);
                if packed.items.len() == self.items.len() {
                    return packed;
                }
                let better = match &best {
                    None => true,
                    Some(b) => packed.volume_utilisation() > b.volume_utilisation(),
                };
                if better {
                    best = Some(packed);
                }
            }
        }

        best.unwrap_or_else(|| PackedCarton::new(Rc::clone(&self.carton), PackedItemList::new()))
    }

    /// Pack as many items as possible with a specific carton rotation,
    /// layer by layer.
    fn pack_rotation(
        &mut self,
        carton_width: u32,
        carton_length: u32,
        mut first_item: Option<OrientatedItem>,
    ) -> PackedCarton {
        self.layer_packer
            .set_carton_is_rotated(self.carton.inner_width != carton_width);

        let mut layers: Vec<PackedLayer> = Vec::new();
        let mut items = self.items.clone();

        while !items.is_empty() {
            let layer_start_depth = packed_depth(&layers);
            let mut packed_list = collect_packed(&layers);
            if !packed_list.is_empty() {
                first_item = None;
            }

            // preliminary pass on a clone of the queue to discover the depth
            // this layer wants to be
            let mut preliminary_items = items.clone();
            let mut preliminary_packed = packed_list.clone();
            let preliminary = self.layer_packer.pack_layer(
                &mut preliminary_items,
                &mut preliminary_packed,
                0,
                0,
                layer_start_depth,
                carton_width,
                carton_length,
                self.carton.inner_depth.saturating_sub(layer_start_depth),
                0,
                true,
                first_item.clone(),
            );
            if preliminary.is_empty() {
                break;
            }

            let preliminary_depth = preliminary.depth();
            if preliminary_depth == preliminary.items()[0].depth {
                // no stacking happened, preliminary == final
                layers.push(preliminary);
                items = preliminary_items;
            } else {
                // redo with the now-known depth so that stacking can reach
                // the same ceiling from the first item of the row
                let layer = self.layer_packer.pack_layer(
                    &mut items,
                    &mut packed_list,
                    0,
                    0,
                    layer_start_depth,
                    carton_width,
                    carton_length,
                    self.carton.inner_depth.saturating_sub(layer_start_depth),
                    preliminary_depth,
                    true,
                    first_item.clone(),
                );
                layers.push(layer);
            }
        }

        if !self.single_pass_mode && !layers.is_empty() {
            layers = self.stabilise_layers(layers);

            // having packed the main layers there may be tall narrow gaps at
            // the ends that can still be used; these fills are opportunistic,
            // so stability is not considered
            let max_end_x = layers.iter().map(|l| l.end_x()).max().unwrap_or(0);
            let mut packed_list = collect_packed(&layers);
            let gap = self.layer_packer.pack_layer(
                &mut items,
                &mut packed_list,
                max_end_x,
                0,
                0,
                carton_width,
                carton_length,
                self.carton.inner_depth,
                self.carton.inner_depth,
                false,
                None,
            );
            layers.push(gap);

            let max_end_y = layers.iter().map(|l| l.end_y()).max().unwrap_or(0);
            let mut packed_list = collect_packed(&layers);
            let gap = self.layer_packer.pack_layer(
                &mut items,
                &mut packed_list,
                0,
                max_end_y,
                0,
                carton_width,
                carton_length,
                self.carton.inner_depth,
                self.carton.inner_depth,
                false,
                None,
            );
            layers.push(gap);
        }

        let layers = self.correct_layer_rotation(layers, carton_width);
        PackedCarton::new(Rc::clone(&self.carton), collect_packed(&layers))
    }

    fn stabilise_layers(&self, layers: Vec<PackedLayer>) -> Vec<PackedLayer> {
        // placement constraints may be positional, so those packs cannot be
        // reshuffled; neither can strict-order ones
        if self.has_constrained_items || self.strict_item_ordering {
            return layers;
        }
        LayerStabiliser::new().stabilise(layers)
    }

    /// Swap the packed items' coordinates back to match the real orientation
    /// of the carton, if it was packed rotated.
    fn correct_layer_rotation(
        &self,
        layers: Vec<PackedLayer>,
        carton_width: u32,
    ) -> Vec<PackedLayer> {
        if self.carton.inner_width == carton_width {
            return layers;
        }

        layers
            .into_iter()
            .map(|layer| {
                let mut swapped = PackedLayer::new();
                for item in layer.items() {
                    swapped.insert(PackedItem::new(
                        Rc::clone(&item.item),
                        item.y,
                        item.x,
                        item.z,
                        item.length,
                        item.width,
                        item.depth,
                    ));
                }
                swapped
            })
            .collect()
    }
}

fn collect_packed(layers: &[PackedLayer]) -> PackedItemList {
    let mut list = PackedItemList::new();
    for layer in layers {
        for item in layer.items() {
            list.insert(item.clone());
        }
    }
    list
}

fn packed_depth(layers: &[PackedLayer]) -> u32 {
    layers.iter().map(|l| l.depth()).sum()
}

/// Applies load stability to a generated result: layers with the greatest
/// footprint go to the bottom, and every item's z is reflowed onto the
/// running floor.
#[derive(Debug, Default)]
pub struct LayerStabiliser;

impl LayerStabiliser {
    pub fn new() -> Self {
        Self
    }

    pub fn stabilise(&self, mut layers: Vec<PackedLayer>) -> Vec<PackedLayer> {
        layers.sort_by(|a, b| {
            b.footprint()
                .cmp(&a.footprint())
                .then_with(|| b.depth().cmp(&a.depth()))
        });

        let mut stabilised = Vec::with_capacity(layers.len());
        let mut current_z = 0;
        for layer in layers {
            let old_start_z = layer.start_z();
            let mut relaid = PackedLayer::new();
            for item in layer.items() {
                relaid.insert(PackedItem::new(
                    Rc::clone(&item.item),
                    item.x,
                    item.y,
                    item.z - old_start_z + current_z,
                    item.width,
                    item.length,
                    item.depth,
                ));
            }
            current_z += relaid.depth();
            stabilised.push(relaid);
        }

        stabilised
    }
}
