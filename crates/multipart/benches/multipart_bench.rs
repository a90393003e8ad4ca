use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use micro_multipart::Multipart;
use std::hint::black_box;
use std::io::{Cursor, Read};

const PAYLOAD_SIZE: usize = 1024 * 1024;

fn build(payload: &[u8]) -> Multipart {
    let mut multipart = Multipart::new().with_chunk_size(64 * 1024);
    multipart.add_field("name", "bench").unwrap();
    multipart.add_bytes("bytes", "bytes.bin", payload).unwrap();
    multipart.add_reader("reader", "reader.bin", Cursor::new(payload.to_vec())).unwrap();
    multipart.finalize().unwrap();
    multipart
}

fn bench_drain(c: &mut Criterion) {
    let payload = vec![0xAB_u8; PAYLOAD_SIZE];

    let mut group = c.benchmark_group("multipart");
    group.throughput(Throughput::Bytes(2 * PAYLOAD_SIZE as u64));

    group.bench_function("read_to_end", |b| {
        b.iter(|| {
            let mut multipart = build(&payload);
            let mut body = Vec::with_capacity(2 * PAYLOAD_SIZE + 1024);
            multipart.read_to_end(&mut body).unwrap();
            black_box(body)
        });
    });

    group.bench_function("next_chunk", |b| {
        b.iter(|| {
            let mut multipart = build(&payload);
            let mut total = 0;
            while let Some(chunk) = multipart.next_chunk().unwrap() {
                total += chunk.len();
            }
            black_box(total)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_drain);
criterion_main!(benches);
