use carton_packer_core::{Carton, Item, Packer, PackerConfig, PackerError, Rotation};

#[test]
fn quantity_limit_is_honoured() {
    let config = PackerConfig::builder()
        .throw_on_unpackable_item(false)
        .build();
    let mut packer = Packer::with_config(config);
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 3);
    packer.add_carton(Carton::new("single", 12, 12, 12, 0, 10, 10, 10, 1000).with_quantity(2));

    let mut packed = packer.pack().expect("partial result");
    assert_eq!(packed.len(), 2, "only two cartons were available");
    for carton in packed.iter() {
        assert_eq!(carton.carton.reference, "single");
        assert_eq!(carton.items.len(), 1);
    }
    assert_eq!(packer.unpacked_items().len(), 1);
}

#[test]
fn exhausted_supply_raises_when_throwing() {
    let mut packer = Packer::new();
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 3);
    packer.add_carton(Carton::new("single", 12, 12, 12, 0, 10, 10, 10, 1000).with_quantity(2));

    match packer.pack() {
        Err(PackerError::NoCartonsAvailable { items, .. }) => assert_eq!(items.len(), 1),
        other => panic!("expected NoCartonsAvailable, got {other:?}"),
    }
}

#[test]
fn larger_fallback_carton_takes_the_overflow() {
    let mut packer = Packer::new();
    packer.add_item(Item::new("cube", 10, 10, 10, 100, Rotation::BestFit), 3);
    packer.add_carton(Carton::new("single", 12, 12, 12, 0, 10, 10, 10, 1000).with_quantity(2));
    packer.add_carton(Carton::new("double", 22, 12, 12, 0, 20, 10, 10, 1000).with_quantity(1));

    let mut packed = packer.pack().expect("fits across the catalogue");
    let total_items: usize = packed.iter().map(|c| c.items.len()).sum();
    assert_eq!(total_items, 3);

    // the supply ledger never over-issues a carton type
    let singles = packed
        .iter()
        .filter(|c| c.carton.reference == "single")
        .count();
    let doubles = packed
        .iter()
        .filter(|c| c.carton.reference == "double")
        .count();
    assert!(singles <= 2);
    assert!(doubles <= 1);
}
