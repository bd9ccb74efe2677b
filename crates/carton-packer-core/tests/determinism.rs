use carton_packer_core::{Carton, Item, PackedCartonList, Packer, PackerConfig, Rotation};

fn run_pack() -> PackedCartonList {
    let config = PackerConfig::builder()
        .throw_on_unpackable_item(false)
        .build();
    let mut packer = Packer::with_config(config);
    packer.add_item(Item::new("widget", 50, 40, 30, 250, Rotation::BestFit), 3);
    packer.add_item(Item::new("gadget", 60, 60, 20, 400, Rotation::KeepFlat), 2);
    packer.add_item(Item::new("doohickey", 25, 25, 25, 150, Rotation::BestFit), 4);
    packer.add_item(Item::new("placard", 80, 50, 5, 90, Rotation::Never), 2);
    packer.add_carton(Carton::new("mailer", 110, 110, 60, 120, 100, 100, 50, 5_000));
    packer.add_carton(Carton::new("crate", 210, 160, 110, 450, 200, 150, 100, 20_000));

    packer.pack().expect("partial results allowed")
}

fn fingerprint(packed: &mut PackedCartonList) -> Vec<(String, String, u32, u32, u32, u32, u32, u32)> {
    packed
        .iter()
        .flat_map(|carton| {
            let reference = carton.carton.reference.clone();
            carton
                .items
                .iter()
                .map(move |item| {
                    (
                        reference.clone(),
                        item.item.description.clone(),
                        item.x,
                        item.y,
                        item.z,
                        item.width,
                        item.length,
                        item.depth,
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn identical_inputs_give_identical_placements() {
    let mut first = run_pack();
    let mut second = run_pack();

    assert_eq!(fingerprint(&mut first), fingerprint(&mut second));
}
