use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::{self, Cursor};
use xnbdec::container::Container;
use xnbdec::varint::{read_7bit_encoded, write_7bit_encoded};
use xnbdec::wav::WaveFormat;
use xnbdec::{SoundEffect, XnbObject};

fn sample_container(data_len: usize, shared: usize) -> Vec<u8> {
    let eff = |n: usize| -> XnbObject {
        SoundEffect::from_wave_format(WaveFormat::pcm(2, 44100, 16), vec![7u8; n]).into()
    };
    let cont = Container::from_objects(
        b'w',
        Some(eff(data_len)),
        (0..shared).map(|_| Some(eff(1024))).collect(),
    )
    .unwrap();
    let mut bytes = Vec::new();
    cont.write(&mut bytes).unwrap();
    bytes
}

fn bench_varint(c: &mut Criterion) {
    let mut bytes = Vec::new();
    for v in (0..1000u32).map(|i| i.wrapping_mul(2_654_435_761)) {
        write_7bit_encoded(&mut bytes, v).unwrap();
    }

    c.bench_function("varint_decode_1000", |b| {
        b.iter(|| {
            let mut cur = Cursor::new(black_box(&bytes));
            for _ in 0..1000 {
                read_7bit_encoded(&mut cur).unwrap();
            }
        })
    });
}

fn bench_decode(c: &mut Criterion) {
    let single = sample_container(1024 * 1024, 0);
    let many   = sample_container(1024, 64);

    c.bench_function("decode_1mb_sound_effect", |b| {
        b.iter(|| Container::read(Cursor::new(black_box(&single))).unwrap())
    });
    c.bench_function("decode_64_shared_resources", |b| {
        b.iter(|| Container::read(Cursor::new(black_box(&many))).unwrap())
    });
}

fn bench_export(c: &mut Criterion) {
    let cont = Container::read(Cursor::new(sample_container(1024 * 1024, 0))).unwrap();
    let primary = cont.primary.as_ref().unwrap();

    c.bench_function("export_1mb_wav", |b| {
        b.iter(|| primary.export(io::sink()).unwrap())
    });
}

criterion_group!(benches, bench_varint, bench_decode, bench_export);
criterion_main!(benches);
