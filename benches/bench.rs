use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ptflow::analysis::{andersen, steensgaard};
use ptflow::{Module, ModuleBuilder};

// ------------------------------------------------------------------
// Synthetic inputs

/// One function threading `n` allocation sites through store/load pairs.
fn chain(n: usize) -> Module {
    let mut mb = ModuleBuilder::new();
    let f = mb.function("chain", 0, true);
    let mut b = mb.body(f);
    let mut prev = b.alloca();
    for _ in 1..n {
        let next = b.alloca();
        b.store(prev, next);
        prev = b.load(next);
    }
    mb.finish()
}

/// `width` phi merges over a shared pair of allocation sites, plus a
/// call layer so the inter-procedural walk has something to chew on.
fn diamonds(width: usize) -> Module {
    let mut mb = ModuleBuilder::new();
    let sink = mb.function("sink", 1, true);
    let main = mb.function("main", 0, true);
    {
        let mut b = mb.body(sink);
        let q = b.param(0);
        let h = b.alloca();
        b.store(h, q);
    }
    {
        let mut b = mb.body(main);
        let a1 = b.alloca();
        let a2 = b.alloca();
        for _ in 0..width {
            b.block();
            let p = b.phi(&[a1, a2]);
            let s = b.select(p, a1);
            b.call(sink, &[s]);
        }
    }
    mb.finish()
}

// ------------------------------------------------------------------

pub fn andersen_chain(c: &mut Criterion) {
    let m = chain(512);
    c.bench_function("andersen::intra(chain-512)", |b| {
        b.iter(|| andersen::intra(black_box(&m)))
    });
}

pub fn andersen_diamonds(c: &mut Criterion) {
    let m = diamonds(256);
    c.bench_function("andersen::inter(diamonds-256)", |b| {
        b.iter(|| andersen::inter(black_box(&m)))
    });
}

pub fn steensgaard_chain(c: &mut Criterion) {
    let m = chain(512);
    c.bench_function("steensgaard::analyze(chain-512)", |b| {
        b.iter(|| steensgaard::analyze(black_box(&m)))
    });
}

pub fn steensgaard_diamonds(c: &mut Criterion) {
    let m = diamonds(256);
    c.bench_function("steensgaard::analyze(diamonds-256)", |b| {
        b.iter(|| steensgaard::analyze(black_box(&m)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = andersen_chain, andersen_diamonds, steensgaard_chain, steensgaard_diamonds
}
criterion_main!(benches);
