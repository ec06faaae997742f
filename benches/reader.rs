use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vvcapture::formats::PointCloudFrame;
use vvcapture::ply::{read_ply_bytes, write_ply};
use vvcapture::utils::natural_cmp;

fn synthetic_frame(points: usize) -> Vec<u8> {
    let mut frame = PointCloudFrame::with_capacity(points);
    for i in 0..points {
        let v = (i % 1024) as f32;
        frame.push([v, (i / 1024) as f32, -v], [i as u8, 128, 255 - i as u8, 255]);
    }
    let mut bytes = vec![];
    write_ply(&frame, &mut bytes).unwrap();
    bytes
}

fn bench_read_ply(c: &mut Criterion) {
    let bytes = synthetic_frame(800_000);
    c.bench_function("read_ply", |b| {
        b.iter(|| {
            _ = read_ply_bytes(black_box(&bytes));
        })
    });
}

fn bench_natural_sort(c: &mut Criterion) {
    let names: Vec<String> = (0..2000)
        .rev()
        .map(|i| format!("longdress_vox10_{}.ply", 1051 + i))
        .collect();
    c.bench_function("natural_sort", |b| {
        b.iter(|| {
            let mut names = names.clone();
            names.sort_by(|a, b| natural_cmp(a, b));
            black_box(names)
        })
    });
}

criterion_group!(benches, bench_read_ply, bench_natural_sort);
criterion_main!(benches);
