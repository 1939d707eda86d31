use criterion::*;
use level::Blockmap;
use math::FixedVertex;
use wad::test_utils::LumpWriter;

/// A 64x64 lattice of vertices 48 units apart, joined by horizontal,
/// vertical and diagonal lines
fn lattice() -> (Vec<FixedVertex>, Vec<(usize, usize)>) {
    const SIDE: usize = 64;
    let mut vertexes = Vec::with_capacity(SIDE * SIDE);
    for y in 0..SIDE {
        for x in 0..SIDE {
            vertexes.push(FixedVertex::from_map_units(x as i16 * 48, y as i16 * 48));
        }
    }

    let mut lines = Vec::new();
    for y in 0..SIDE - 1 {
        for x in 0..SIDE - 1 {
            let v = y * SIDE + x;
            lines.push((v, v + 1));
            lines.push((v, v + SIDE));
            lines.push((v, v + SIDE + 1));
        }
    }
    (vertexes, lines)
}

/// A 64x64 cell BLOCKMAP lump with four lines per cell
fn lump() -> Vec<u8> {
    const CELLS: u16 = 64 * 64;
    let list_start = 4 + CELLS;
    let mut writer = LumpWriter::new().i16(0).i16(0).i16(64).i16(64);
    for cell in 0..CELLS {
        writer = writer.u16(list_start + cell * 6);
    }
    for cell in 0..CELLS {
        writer = writer
            .u16(0)
            .u16(cell % 500)
            .u16(cell % 501)
            .u16(cell % 502)
            .u16(cell % 503)
            .u16(0xFFFF);
    }
    writer.finish()
}

fn bench(c: &mut Criterion) {
    let (vertexes, lines) = lattice();
    c.bench_function("Build blockmap for 12k lines", |b| {
        b.iter(|| Blockmap::build_from_lines(black_box(&vertexes), lines.iter().copied()))
    });

    let data = lump();
    c.bench_function("Decode 64x64 BLOCKMAP lump", |b| {
        b.iter(|| Blockmap::from_lump(black_box(&data)))
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
