use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rdb_stream::{
    rdb::lzf::decompress, EventRecorder, FilterRules, NoopCallbacks, Reader, ReaderConfig,
};

fn length(n: usize) -> Vec<u8> {
    if n < 64 {
        vec![n as u8]
    } else if n < 16384 {
        vec![0x40 | (n >> 8) as u8, (n & 0xFF) as u8]
    } else {
        let mut out = vec![0x80];
        out.extend_from_slice(&(n as u32).to_be_bytes());
        out
    }
}

fn string(s: &[u8]) -> Vec<u8> {
    let mut out = length(s.len());
    out.extend_from_slice(s);
    out
}

/// Литерал из 8 байт и повторяющиеся back-reference по 264 байта.
fn lzf_input(repeats: usize) -> (Vec<u8>, usize) {
    let mut input = vec![7];
    input.extend_from_slice(b"abcdefgh");
    for _ in 0..repeats {
        input.extend_from_slice(&[0xE0, 255, 7]);
    }
    (input, 8 + repeats * 264)
}

/// Снапшот с `keys` строками, списками и hash по 16 элементов.
fn snapshot(keys: usize) -> Vec<u8> {
    let mut buf = b"REDIS0006\xFE\x00".to_vec();
    for i in 0..keys {
        buf.push(0);
        buf.extend(string(format!("str:{i}").as_bytes()));
        buf.extend(string(b"some reasonably sized value"));

        buf.push(1);
        buf.extend(string(format!("list:{i}").as_bytes()));
        buf.extend(length(16));
        for j in 0..16 {
            buf.extend(string(format!("item-{j}").as_bytes()));
        }

        buf.push(4);
        buf.extend(string(format!("hash:{i}").as_bytes()));
        buf.extend(length(16));
        for j in 0..16 {
            buf.extend(string(format!("field-{j}").as_bytes()));
            buf.extend(string(format!("value-{j}").as_bytes()));
        }
    }
    buf.push(0xFF);
    buf
}

fn bench_lzf(c: &mut Criterion) {
    let mut group = c.benchmark_group("lzf_decompress");
    for repeats in [16usize, 256, 4096] {
        let (input, expected) = lzf_input(repeats);
        group.throughput(Throughput::Bytes(expected as u64));
        group.bench_with_input(BenchmarkId::from_parameter(expected), &input, |b, input| {
            b.iter(|| decompress(black_box(input), expected).unwrap())
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let bytes = snapshot(1_000);
    let reader = Reader::new(ReaderConfig::default());

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("noop", |b| {
        b.iter(|| {
            reader
                .parse(black_box(&bytes[..]), &mut NoopCallbacks, None)
                .unwrap()
        })
    });

    group.bench_function("recorder", |b| {
        b.iter(|| {
            let mut rec = EventRecorder::new();
            reader.parse(black_box(&bytes[..]), &mut rec, None).unwrap();
            rec.len()
        })
    });

    group.bench_function("skip_all", |b| {
        b.iter(|| {
            let mut rules = FilterRules::new().with_databases([9]);
            reader
                .parse(black_box(&bytes[..]), &mut NoopCallbacks, Some(&mut rules))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_lzf, bench_parse);
criterion_main!(benches);
