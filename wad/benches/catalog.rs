use criterion::*;
use wad::test_utils::WadBuilder;
use wad::{Wad, WadData, WadKind};

/// An IWAD-like layout: globals, sprites, flats, and a run of maps
fn synthetic_iwad() -> Vec<u8> {
    let mut builder = WadBuilder::iwad().lump("PLAYPAL", vec![0; 10752]);
    builder = builder.marker("S_START");
    for i in 0..1000 {
        builder = builder.lump(&format!("SPR{:04}", i), vec![0; 64]);
    }
    builder = builder.marker("S_END").marker("F_START");
    for i in 0..200 {
        builder = builder.lump(&format!("FLAT{:04}", i), vec![0; 4096]);
    }
    builder = builder.marker("F_END");
    for m in 1..=32 {
        builder = builder.marker(&format!("MAP{:02}", m));
        for lump in [
            "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS",
            "REJECT", "BLOCKMAP",
        ] {
            builder = builder.lump(lump, vec![0; 256]);
        }
    }
    builder.build()
}

fn bench(c: &mut Criterion) {
    let bytes = synthetic_iwad();

    c.bench_function("Decode synthetic IWAD directory", |b| {
        b.iter(|| Wad::from_bytes("bench.wad", bytes.clone(), WadKind::Iwad))
    });

    let wad = Wad::from_bytes("bench.wad", bytes.clone(), WadKind::Iwad).unwrap();
    c.bench_function("Build lump directory with coalescing", |b| {
        b.iter(|| WadData::new(vec![wad.clone()]))
    });

    let data = WadData::new(vec![wad]).unwrap();
    c.bench_function("Find MAP17 by name", |b| {
        b.iter(|| data.lump(black_box("MAP17")).map(|l| l.index()))
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
