use criterion::{criterion_group, criterion_main, Criterion};
use picamera::{software::SoftwareBackend, Camera, PixelFormat};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

pub fn benchmark_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");
    for format in [PixelFormat::I420, PixelFormat::YUYV, PixelFormat::RGBA] {
        let mut camera = Camera::open(&SoftwareBackend::default(), 640, 480, 1000).unwrap();
        camera.set_format(format).unwrap();
        camera.enable();

        group.bench_function(format!("acquire-release/{}", format), |b| {
            b.iter(|| {
                let frame = camera.get_frame(TIMEOUT).unwrap();
                let bytes: usize = frame.planes().map(|plane| plane.data.len()).sum();
                frame.release();
                bytes
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_capture);
criterion_main!(benches);
