// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::{Args, BackendSetting};
use clap::Parser;
use kanal::Receiver;
use picamera::{
    mmal::MmalBackend,
    pipeline::Backend,
    snapshot::{encode_jpeg, Snapshot},
    software::SoftwareBackend,
    Camera, Error as CameraError,
};
use std::{
    error::Error,
    fs,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

mod args;

fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // The journal is optional, e.g. when running inside a container.
    let journald = tracing_journald::layer().ok();
    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default())
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    match args.backend {
        BackendSetting::Mmal => capture(&MmalBackend::load(&args.library)?, &args),
        BackendSetting::Software => capture(&SoftwareBackend::new(args.pool), &args),
    }
}

fn capture<B: Backend>(backend: &B, args: &Args) -> Result<(), Box<dyn Error>> {
    let transform = args
        .transform()
        .ok_or_else(|| format!("rotation {} is not a multiple of 90", args.rotation))?;

    let mut camera = Camera::open(backend, args.size[0], args.size[1], args.fps)?;
    camera.set_transform(transform)?;
    camera.set_crop(args.crop())?;
    camera.set_format(args.format)?;
    info!("{}", camera);

    fs::create_dir_all(&args.output)?;

    // JPEG encoding lives in a thread since it can be significantly slower
    // than the camera's frame rate. Frames are copied and released right
    // away so the pipeline never runs out of buffers.
    let (tx, rx) = kanal::unbounded();
    let output = args.output.clone();
    let quality = args.quality;
    let writer = thread::spawn(move || write_jpegs(rx, output, quality));

    camera.enable();
    let timeout = Duration::from_millis(args.timeout);
    for index in 0..args.frames {
        let now = Instant::now();
        let snapshot = match camera.get_frame(timeout) {
            Ok(frame) => {
                let snapshot = Snapshot::from_frame(&frame);
                frame.release();
                snapshot
            }
            Err(CameraError::NoFrameAvailable) => {
                warn!("no frame within {:?}", timeout);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        debug!("frame {} capture: {:?}", index, now.elapsed());

        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }

        if tx.send((index, snapshot)).is_err() {
            warn!("jpeg writer exited early");
            break;
        }
    }

    camera.disable();
    camera.close();
    drop(tx);

    match writer.join() {
        Ok(written) => info!("wrote {} of {} frames", written, args.frames),
        Err(_) => return Err(Box::from("jpeg writer panicked")),
    }
    Ok(())
}

fn write_jpegs(rx: Receiver<(usize, Snapshot)>, output: PathBuf, quality: i32) -> usize {
    let mut written = 0;
    while let Ok((index, snapshot)) = rx.recv() {
        let now = Instant::now();
        let jpeg = match encode_jpeg(&snapshot, quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                error!("frame {} encode failed: {}", index, e);
                continue;
            }
        };

        let path = output.join(format!("out_{index}.jpg"));
        match fs::write(&path, &jpeg[..]) {
            Ok(()) => {
                written += 1;
                debug!(
                    "saved {} {}x{} size: {}KB encode: {:?}",
                    path.display(),
                    snapshot.width(),
                    snapshot.height(),
                    jpeg.len() / 1024,
                    now.elapsed()
                );
            }
            Err(e) => error!("couldn't write {}: {}", path.display(), e),
        }
    }
    written
}
