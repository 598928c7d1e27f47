use code_link::{decode_with, encode_with, radix, EngineLoader, ZstdLoader};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};

fn source_text(len: usize) -> String {
    const LINES: &[&str] = &[
        "local count = 0\n",
        "for i = 1, 100 do\n",
        "  count = count + i\n",
        "end\n",
        "print(\"total: \" .. count)\n",
        "-- a comment that runs on for a little while\n",
    ];
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    let mut s = String::with_capacity(len + 64);
    while s.len() < len {
        s.push_str(LINES[rng.gen_range(0..LINES.len())]);
    }
    s
}

fn link_benches(c: &mut Criterion) {
    let engine = futures_executor::block_on(ZstdLoader.load()).unwrap();

    let mut group = c.benchmark_group("link");
    for len in [100usize, 4_000, 50_000] {
        let source = source_text(len);
        let token = encode_with(&engine, &source).unwrap();
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &source, |b, s| {
            b.iter(|| encode_with(&engine, s).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &token, |b, t| {
            b.iter(|| decode_with(&engine, t, usize::MAX).unwrap())
        });
    }
    group.finish();

    let mut group = c.benchmark_group("radix");
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let bytes: Vec<u8> = (0..16_384).map(|_| rng.gen()).collect();
    let token = radix::encode(&bytes);
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| b.iter(|| radix::encode(&bytes)));
    group.bench_function("decode", |b| b.iter(|| radix::decode(&token).unwrap()));
    group.finish();
}

criterion_group!(benches, link_benches);
criterion_main!(benches);
