use std::rc::Rc;

use carton_packer_core::{
    Carton, Item, PackedItemList, Packer, PlacementConstraint, Rotation,
};

/// At most `limit` items of one SKU per carton, however much room is left.
struct MaxCountPerCarton {
    description: String,
    limit: usize,
}

impl PlacementConstraint for MaxCountPerCarton {
    fn can_be_packed(
        &self,
        _carton: &Carton,
        packed: &PackedItemList,
        _x: u32,
        _y: u32,
        _z: u32,
        _width: u32,
        _length: u32,
        _depth: u32,
    ) -> bool {
        packed
            .iter()
            .filter(|p| p.item.description == self.description)
            .count()
            < self.limit
    }
}

/// Floor placement only: nothing may sit on top of anything else.
struct FloorOnly;

impl PlacementConstraint for FloorOnly {
    fn can_be_packed(
        &self,
        _carton: &Carton,
        _packed: &PackedItemList,
        _x: u32,
        _y: u32,
        z: u32,
        _width: u32,
        _length: u32,
        _depth: u32,
    ) -> bool {
        z == 0
    }
}

#[test]
fn max_count_constraint_spills_into_another_carton() {
    let constraint = Rc::new(MaxCountPerCarton {
        description: "battery".into(),
        limit: 2,
    });
    let battery =
        Item::new("battery", 10, 10, 10, 50, Rotation::BestFit).with_constraint(constraint);

    let mut packer = Packer::new();
    packer.add_item(battery, 3);
    packer.add_carton(Carton::new("tray", 32, 12, 12, 0, 30, 10, 10, 1000));

    let mut packed = packer.pack().expect("fits across two cartons");
    assert_eq!(packed.len(), 2);

    let mut counts: Vec<usize> = packed.iter().map(|c| c.items.len()).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2], "never more than two batteries per carton");
}

#[test]
fn floor_only_constraint_prevents_stacking() {
    let aerosol =
        Item::new("aerosol", 10, 10, 10, 50, Rotation::BestFit).with_constraint(Rc::new(FloorOnly));

    let mut packer = Packer::new();
    packer.add_item(aerosol, 2);
    packer.add_carton(Carton::new("tower", 12, 12, 22, 0, 10, 10, 20, 1000));

    let mut packed = packer.pack().expect("fits across two cartons");
    assert_eq!(packed.len(), 2, "the second item may not sit on the first");

    for carton in packed.iter() {
        assert_eq!(carton.items.len(), 1);
        assert_eq!(carton.items.iter().next().unwrap().z, 0);
    }
}

#[test]
fn unconstrained_twin_scenario_stacks_fine() {
    // the same geometry without the hook packs into a single carton
    let cube = Item::new("cube", 10, 10, 10, 50, Rotation::BestFit);

    let mut packer = Packer::new();
    packer.add_item(cube, 2);
    packer.add_carton(Carton::new("tower", 12, 12, 22, 0, 10, 10, 20, 1000));

    let mut packed = packer.pack().expect("fits");
    assert_eq!(packed.len(), 1);
    assert_eq!(packed.iter().next().unwrap().items.len(), 2);
}
