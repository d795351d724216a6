use criterion::{criterion_group, criterion_main, Criterion};
use picamera::{
    snapshot::{encode_jpeg, Snapshot},
    software::SoftwareBackend,
    Camera, PixelFormat,
};
use std::time::Duration;

fn snapshot(width: u32, height: u32, format: PixelFormat) -> Snapshot {
    let mut camera = Camera::open(&SoftwareBackend::new(1), width, height, 100).unwrap();
    camera.set_format(format).unwrap();
    camera.enable();
    let frame = camera.get_frame(Duration::from_secs(5)).unwrap();
    Snapshot::from_frame(&frame)
}

pub fn benchmark_encode(c: &mut Criterion) {
    for format in [PixelFormat::RGBA, PixelFormat::I420] {
        let mut group = c.benchmark_group(format!("jpeg/{}", format));
        for dim in [(320, 240), (640, 480), (1280, 720), (1920, 1080)].iter() {
            let snap = snapshot(dim.0, dim.1, format);
            group.bench_with_input(format!("{}x{}", dim.0, dim.1), &snap, |b, snap| {
                b.iter(|| encode_jpeg(snap, 90).unwrap())
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benchmark_encode);
criterion_main!(benches);
