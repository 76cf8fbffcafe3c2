use log::*;
use object_recording::rec_core::nalgebra::{UnitQuaternion, Vector3};
use object_recording::rec_core::{CameraToObject, Pose};
use object_recording::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "recording-sandbox",
    about = "A tool for running synthetic capture sessions through the object recorder"
)]
struct Opt {
    /// The file where settings are specified.
    ///
    /// This is in the format of `object_recording::RecordingSettings`.
    #[structopt(short, long, default_value = "recording-settings.json")]
    settings: PathBuf,
    /// Seed of the simulated sensor trajectory
    #[structopt(long, default_value = "5")]
    seed: u8,
    /// The maximum number of frames fed to the recorder
    #[structopt(short, long, default_value = "500")]
    frames: usize,
    /// The maximum offset in meters of the sensor from the viewpoint it aims for
    #[structopt(long, default_value = "0.06")]
    translation_noise: f64,
    /// The maximum rotation in radians about each axis away from the viewpoint it aims for
    #[structopt(long, default_value = "0.08")]
    rotation_noise: f64,
    /// The lowest score the simulated detector reports
    #[structopt(long, default_value = "0.6")]
    min_score: f64,
    /// The highest score the simulated detector reports
    #[structopt(long, default_value = "1.0")]
    max_score: f64,
    /// Number of markers detected per frame
    #[structopt(long, default_value = "2")]
    markers: usize,
    /// Probability that the markers are occluded in a frame
    #[structopt(long, default_value = "0.05")]
    occlusion: f64,
    /// Width of the simulated image and cloud
    #[structopt(long, default_value = "64")]
    width: u32,
    /// Height of the simulated image and cloud
    #[structopt(long, default_value = "48")]
    height: u32,
    /// Stop even if some viewpoints were never recorded
    #[structopt(long)]
    force_stop: bool,
}

/// Produces frames of a sensor that is carried roughly towards randomly chosen
/// viewpoints.
struct SimulatedSensor {
    opt: Opt,
    rng: Pcg64,
    frame: u64,
}

impl SimulatedSensor {
    fn new(opt: Opt) -> Self {
        let rng = Pcg64::from_seed([opt.seed; 32]);
        Self { opt, rng, frame: 0 }
    }

    fn noise(&mut self, bound: f64) -> f64 {
        self.rng.gen_range(-bound..=bound)
    }

    fn score(&mut self) -> f64 {
        if self.opt.max_score > self.opt.min_score {
            self.rng.gen_range(self.opt.min_score..self.opt.max_score)
        } else {
            self.opt.min_score
        }
    }

    /// A frame taken near `target`.
    fn capture(&mut self, target: CameraToObject) -> SynchronizedFrame {
        let (t, r) = (self.opt.translation_noise, self.opt.rotation_noise);
        let offset = Vector3::new(self.noise(t), self.noise(t), self.noise(t));
        let wobble = UnitQuaternion::from_euler_angles(self.noise(r), self.noise(r), self.noise(r));
        let viewpoint =
            CameraToObject::from_parts(target.translation() + offset, target.rotation() * wobble);

        let occluded = self.rng.gen_bool(self.opt.occlusion.clamp(0.0, 1.0));
        let markers = if occluded { 0 } else { self.opt.markers };
        let detections = (0..markers)
            .map(|id| MarkerDetection {
                label: "tag_25".to_string(),
                id: id as i32,
                pose: viewpoint.inverse(),
                score: self.score(),
            })
            .collect();

        let depth = viewpoint.translation().norm() as f32;
        let header = FrameHeader {
            stamp_ns: self.frame * 33_333_333,
            frame_id: "camera_optical_frame".to_string(),
        };
        let shade = (self.frame % 256) as u8;
        self.frame += 1;
        SynchronizedFrame {
            detections: DetectionList { header, detections },
            cloud: self.cloud(depth, shade),
            image: self.image(shade),
        }
    }

    fn image(&self, shade: u8) -> RawImage {
        let (width, height) = (self.opt.width, self.opt.height);
        let mut data = Vec::with_capacity(3 * (width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[shade, (y % 256) as u8, (x % 256) as u8]);
            }
        }
        RawImage {
            width,
            height,
            encoding: ImageEncoding::Bgr8.to_string(),
            is_bigendian: false,
            step: 3 * width,
            data,
        }
    }

    /// A plane facing the sensor at the depth of the object, with the border
    /// pixels left without depth.
    fn cloud(&self, depth: f32, shade: u8) -> RawPointCloud {
        let (width, height) = (self.opt.width, self.opt.height);
        let mut points = Vec::with_capacity((width * height) as usize);
        for v in 0..height {
            for u in 0..width {
                let border = u == 0 || v == 0 || u + 1 == width || v + 1 == height;
                points.push(if border {
                    PackedPoint {
                        x: f32::NAN,
                        y: f32::NAN,
                        z: f32::NAN,
                        rgb: 0.0,
                    }
                } else {
                    PackedPoint {
                        x: (u as f32 / width as f32 - 0.5) * depth,
                        y: (v as f32 / height as f32 - 0.5) * depth,
                        z: depth,
                        rgb: pack_rgb([(u % 256) as u8, (v % 256) as u8, shade]),
                    }
                });
            }
        }
        RawPointCloud {
            width,
            height,
            points,
        }
    }
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let settings = std::fs::File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: RecordingSettings = settings.unwrap_or_default();

    let mut recorder = match ObjectRecorder::new(settings, LogSink) {
        Ok(recorder) => recorder,
        Err(e) => {
            error!("cannot record with these settings: {}", e);
            std::process::exit(1);
        }
    };
    recorder.start_recording(StartRecordingRequest);
    let targets: Vec<CameraToObject> = recorder.slots().iter().map(|s| s.desired_pose()).collect();

    let mut sensor = SimulatedSensor::new(opt.clone());
    let (mut dropped, mut processed, mut failed) = (0usize, 0usize, 0usize);
    for _ in 0..opt.frames {
        if recorder.session().is_complete() {
            break;
        }
        let target = targets[sensor.rng.gen_range(0..targets.len())];
        match recorder.dispatch(sensor.capture(target)) {
            Some(Ok(FrameOutcome::Processed { .. })) => processed += 1,
            Some(Ok(_)) => dropped += 1,
            Some(Err(_)) => failed += 1,
            None => break,
        }
    }
    info!(
        "fed {} frames: {} processed, {} dropped, {} failed",
        processed + dropped + failed,
        processed,
        dropped,
        failed
    );

    let stopped = recorder
        .stop_recording(StopRecordingRequest {
            stop_although_model_is_incomplete: opt.force_stop,
        })
        .recording_stopped;
    if !stopped {
        warn!(
            "only {} of {} perspectives recorded; pass --force-stop to stop anyway",
            recorder.session().completed_count(),
            targets.len()
        );
    }

    for (ix, slot) in recorder.slots().iter().enumerate() {
        let perspective = slot.perspective();
        if slot.completed() {
            info!(
                "perspective {}: pan={:.3} tilt={:.3} distance={:.4} sharpness={:.3}",
                ix + 1,
                perspective.pan,
                perspective.tilt,
                slot.distance_to_desired(),
                slot.sharpness_score()
            );
        } else {
            info!(
                "perspective {}: pan={:.3} tilt={:.3} missing",
                ix + 1,
                perspective.pan,
                perspective.tilt
            );
        }
    }

    let saved = recorder
        .save_recorded_object(SaveRecordedObjectRequest, &mut DiscardWriter)
        .saved;
    info!("saved: {}", saved);
}
