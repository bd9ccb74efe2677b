use carton_packer_core::{Carton, Item, Packer, PackerConfig, Rotation};

#[test]
fn strict_mode_packs_items_in_the_order_given() {
    let config = PackerConfig::builder().strict_item_ordering(true).build();
    let mut packer = Packer::with_config(config);
    // given smallest-first, which the default sorter would reverse
    packer.add_item(Item::new("small", 10, 10, 10, 100, Rotation::BestFit), 1);
    packer.add_item(Item::new("large", 20, 20, 20, 100, Rotation::BestFit), 1);
    packer.add_carton(Carton::new("box", 22, 22, 32, 0, 20, 20, 30, 1000));

    let mut packed = packer.pack().expect("fits");
    assert_eq!(packed.len(), 1);

    let carton = packed.iter().next().unwrap();
    let small = carton
        .items
        .iter()
        .find(|i| i.item.description == "small")
        .unwrap();
    let large = carton
        .items
        .iter()
        .find(|i| i.item.description == "large")
        .unwrap();

    // the small item went in first, so it sits on the floor with the large
    // one above it; no stabilisation pass reshuffles them afterwards
    assert_eq!(small.z, 0);
    assert_eq!(large.z, 10);
}

#[test]
fn default_mode_reorders_largest_first() {
    let mut packer = Packer::new();
    packer.add_item(Item::new("small", 10, 10, 10, 100, Rotation::BestFit), 1);
    packer.add_item(Item::new("large", 20, 20, 20, 100, Rotation::BestFit), 1);
    packer.add_carton(Carton::new("box", 22, 22, 32, 0, 20, 20, 30, 1000));

    let mut packed = packer.pack().expect("fits");
    let carton = packed.iter().next().unwrap();
    let large = carton
        .items
        .iter()
        .find(|i| i.item.description == "large")
        .unwrap();
    assert_eq!(large.z, 0, "the default sorter packs the large item first");
}
