use carton_packer_core::{Carton, Item, Packer, PackerConfig, Rotation};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_items(count: usize, seed: u64) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let rotation = match rng.gen_range(0..3) {
                0 => Rotation::Never,
                1 => Rotation::KeepFlat,
                _ => Rotation::BestFit,
            };
            Item::new(
                format!("item {i}"),
                rng.gen_range(20..120),
                rng.gen_range(20..120),
                rng.gen_range(20..120),
                rng.gen_range(50..500),
                rotation,
            )
        })
        .collect()
}

fn catalogue() -> Vec<Carton> {
    vec![
        Carton::new("small", 260, 260, 110, 160, 250, 250, 100, 10_000),
        Carton::new("medium", 410, 310, 260, 320, 400, 300, 250, 15_000),
        Carton::new("large", 610, 410, 410, 640, 600, 400, 400, 30_000),
    ]
}

fn bench_pack(c: &mut Criterion) {
    let items = random_items(40, 42);
    let cartons = catalogue();

    c.bench_function("pack_40_random_items", |b| {
        b.iter(|| {
            let config = PackerConfig::builder()
                .throw_on_unpackable_item(false)
                .build();
            let mut packer = Packer::with_config(config);
            for item in &items {
                packer.add_item(item.clone(), 1);
            }
            for carton in &cartons {
                packer.add_carton(carton.clone());
            }
            packer.pack().expect("no timeout configured")
        })
    });
}

criterion_group!(benches, bench_pack);
criterion_main!(benches);
