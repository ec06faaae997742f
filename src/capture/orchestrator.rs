use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::ImageError;
use log::{debug, info};
use thiserror::Error;

use super::planner::PlannedShot;
use crate::render::{CameraPose, Encoder, OffscreenTarget, RenderBackend, RenderError};

type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture requested before initialize() or after shutdown()")]
    NotInitialized,
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode image: {0}")]
    Encode(#[from] ImageError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Where and how large the captured images are
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pngs"),
            prefix: "longdress".to_string(),
            width: 1024,
            height: 1024,
        }
    }
}

/// One pose of a pass together with the file it is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureShot {
    pub ring: String,
    pub index: u32,
    pub pose: CameraPose,
    pub filename: String,
}

/// The ordered shots of a single capture pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureJob {
    pub label: String,
    pub shots: Vec<CaptureShot>,
}

impl CaptureJob {
    pub fn new(plan: &[PlannedShot], prefix: &str, label: &str, extension: &str) -> Self {
        let shots = plan
            .iter()
            .map(|shot| CaptureShot {
                ring: shot.ring.clone(),
                index: shot.index,
                pose: shot.pose,
                filename: format!(
                    "{}_{}_{}_{:02}.{}",
                    prefix, label, shot.ring, shot.index, extension
                ),
            })
            .collect();
        Self {
            label: label.to_string(),
            shots,
        }
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}

/// A written capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub ring: String,
    pub index: u32,
    pub path: PathBuf,
}

/// Renders the scene held by the backend from every planned pose and writes one image per pose.
///
/// The offscreen target only exists between [initialize](Self::initialize) and
/// [shutdown](Self::shutdown).
pub struct CaptureOrchestrator<B, E> {
    backend: B,
    encoder: E,
    settings: CaptureSettings,
    target: Option<OffscreenTarget>,
}

impl<B: RenderBackend, E: Encoder> CaptureOrchestrator<B, E> {
    pub fn new(backend: B, encoder: E, settings: CaptureSettings) -> Self {
        Self {
            backend,
            encoder,
            settings,
            target: None,
        }
    }

    pub fn initialize(&mut self) {
        if self.target.is_none() {
            debug!(
                "Allocating {}x{} offscreen target",
                self.settings.width, self.settings.height
            );
            self.target = Some(OffscreenTarget::new(
                self.settings.width,
                self.settings.height,
            ));
        }
    }

    pub fn shutdown(&mut self) {
        self.target = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.target.is_some()
    }

    /// The scene shown in every capture
    pub fn scene_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Captures every shot of `plan` before returning. Returns the number of images written.
    pub fn run_blocking(&mut self, plan: &[PlannedShot], frame_label: &str) -> Result<usize> {
        if !self.is_initialized() {
            return Err(CaptureError::NotInitialized);
        }
        let job = self.job(plan, frame_label);
        self.ensure_output_dir()?;
        for shot in &job.shots {
            self.capture_shot(shot)?;
        }
        info!(
            "Captured {} images for {} into {:?}",
            job.len(),
            frame_label,
            self.settings.output_dir
        );
        Ok(job.len())
    }

    /// Starts a pass labelled with the current local time that captures one shot per call to
    /// [Iterator::next].
    pub fn run_cooperative(&mut self, plan: &[PlannedShot]) -> Result<CooperativeCapture<'_, B, E>> {
        let label = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.run_cooperative_labelled(plan, &label)
    }

    pub(crate) fn run_cooperative_labelled(
        &mut self,
        plan: &[PlannedShot],
        label: &str,
    ) -> Result<CooperativeCapture<'_, B, E>> {
        if !self.is_initialized() {
            return Err(CaptureError::NotInitialized);
        }
        let job = self.job(plan, label);
        self.ensure_output_dir()?;
        Ok(CooperativeCapture {
            orchestrator: self,
            job,
            next: 0,
            written: 0,
            done: false,
        })
    }

    fn job(&self, plan: &[PlannedShot], label: &str) -> CaptureJob {
        CaptureJob::new(plan, &self.settings.prefix, label, self.encoder.extension())
    }

    fn ensure_output_dir(&self) -> Result<()> {
        let dir = &self.settings.output_dir;
        fs::create_dir_all(dir).map_err(|source| CaptureError::Io {
            path: dir.clone(),
            source,
        })
    }

    fn capture_shot(&mut self, shot: &CaptureShot) -> Result<CaptureRecord> {
        let target = self.target.as_mut().ok_or(CaptureError::NotInitialized)?;
        self.backend.render(&shot.pose, target)?;
        let bytes = self.encoder.encode(&target.read_back())?;

        let path = self.settings.output_dir.join(&shot.filename);
        write_file(&path, &bytes)?;
        debug!("Wrote {:?}", path);
        Ok(CaptureRecord {
            ring: shot.ring.clone(),
            index: shot.index,
            path,
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A capture pass that advances one pose per [Iterator::next].
///
/// Holds the orchestrator mutably until dropped. After an error, a cancel or the last shot the
/// iterator only returns `None`.
pub struct CooperativeCapture<'a, B, E> {
    orchestrator: &'a mut CaptureOrchestrator<B, E>,
    job: CaptureJob,
    next: usize,
    written: usize,
    done: bool,
}

impl<'a, B: RenderBackend, E: Encoder> CooperativeCapture<'a, B, E> {
    pub fn label(&self) -> &str {
        &self.job.label
    }

    /// Stops the pass. Images already written are kept.
    pub fn cancel(&mut self) {
        if !self.done {
            info!(
                "Capture {} cancelled after {} of {} images",
                self.job.label,
                self.written,
                self.job.len()
            );
            self.done = true;
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn remaining(&self) -> usize {
        if self.done {
            0
        } else {
            self.job.len() - self.next
        }
    }
}

impl<'a, B: RenderBackend, E: Encoder> Iterator for CooperativeCapture<'a, B, E> {
    type Item = Result<CaptureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(shot) = self.job.shots.get(self.next) else {
            info!(
                "Captured {} images for {} into {:?}",
                self.written,
                self.job.label,
                self.orchestrator.settings.output_dir
            );
            self.done = true;
            return None;
        };
        self.next += 1;
        match self.orchestrator.capture_shot(shot) {
            Ok(record) => {
                self.written += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::planner::{plan, RingConfig};
    use crate::formats::PointCloudFrame;
    use crate::render::{PngEncoder, Scene};
    use cgmath::Point3;
    use image::{Rgb, RgbImage};

    /// Fills the target with a colour derived from the number of points in the scene.
    #[derive(Default)]
    struct FlatBackend {
        points: usize,
        renders: usize,
    }

    impl Scene for FlatBackend {
        fn replace_points(&mut self, frame: &PointCloudFrame) {
            self.points = frame.number_of_points;
        }
    }

    impl RenderBackend for FlatBackend {
        fn render(
            &mut self,
            _pose: &CameraPose,
            target: &mut OffscreenTarget,
        ) -> std::result::Result<(), RenderError> {
            self.renders += 1;
            target.clear([self.points as u8, 0, 0]);
            Ok(())
        }
    }

    struct RawEncoder;

    impl Encoder for RawEncoder {
        fn extension(&self) -> &'static str {
            "raw"
        }

        fn encode(&self, image: &RgbImage) -> std::result::Result<Vec<u8>, ImageError> {
            Ok(image.as_raw().clone())
        }
    }

    fn two_camera_plan() -> Vec<PlannedShot> {
        let ring = RingConfig {
            name: "Ring".to_string(),
            camera_count: 2,
            ..Default::default()
        };
        plan(&[ring], Point3::new(0.0, 0.0, 0.0)).unwrap()
    }

    fn settings(dir: &Path) -> CaptureSettings {
        CaptureSettings {
            output_dir: dir.join("out"),
            prefix: "test".to_string(),
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn capture_requires_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            CaptureOrchestrator::new(FlatBackend::default(), RawEncoder, settings(dir.path()));
        assert!(matches!(
            orchestrator.run_blocking(&two_camera_plan(), "0000"),
            Err(CaptureError::NotInitialized)
        ));

        orchestrator.initialize();
        orchestrator.shutdown();
        assert!(matches!(
            orchestrator.run_cooperative(&two_camera_plan()),
            Err(CaptureError::NotInitialized)
        ));
        assert_eq!(orchestrator.scene_mut().renders, 0);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn blocking_pass_writes_one_file_per_pose() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            CaptureOrchestrator::new(FlatBackend::default(), RawEncoder, settings(dir.path()));
        orchestrator.initialize();
        orchestrator
            .scene_mut()
            .replace_points(&PointCloudFrame::new(vec![[0.0; 3]; 9], vec![[0; 4]; 9]));

        let written = orchestrator.run_blocking(&two_camera_plan(), "0007").unwrap();
        assert_eq!(written, 2);
        for name in ["test_0007_Ring_00.raw", "test_0007_Ring_01.raw"] {
            let bytes = fs::read(dir.path().join("out").join(name)).unwrap();
            assert_eq!(bytes.len(), 4 * 4 * 3);
            assert_eq!(&bytes[..3], &[9, 0, 0]);
        }

        // files are overwritten by a second pass with the same label
        orchestrator
            .scene_mut()
            .replace_points(&PointCloudFrame::new(vec![[0.0; 3]], vec![[0; 4]]));
        orchestrator.run_blocking(&two_camera_plan(), "0007").unwrap();
        let bytes = fs::read(dir.path().join("out/test_0007_Ring_00.raw")).unwrap();
        assert_eq!(&bytes[..3], &[1, 0, 0]);
    }

    #[test]
    fn cooperative_pass_advances_one_pose_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            CaptureOrchestrator::new(FlatBackend::default(), RawEncoder, settings(dir.path()));
        orchestrator.initialize();
        let plan = two_camera_plan();

        let mut capture = orchestrator.run_cooperative_labelled(&plan, "snap").unwrap();
        assert_eq!(capture.remaining(), 2);
        let first = capture.next().unwrap().unwrap();
        assert_eq!(first.ring, "Ring");
        assert_eq!(first.index, 0);
        assert_eq!(first.path, dir.path().join("out/test_snap_Ring_00.raw"));
        assert!(first.path.exists());
        assert!(!dir.path().join("out/test_snap_Ring_01.raw").exists());

        let second = capture.next().unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert!(capture.next().is_none());
        assert!(capture.next().is_none());
        assert_eq!(capture.written(), 2);
        drop(capture);
        assert_eq!(orchestrator.scene_mut().renders, 2);
    }

    #[test]
    fn cancelled_pass_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            CaptureOrchestrator::new(FlatBackend::default(), RawEncoder, settings(dir.path()));
        orchestrator.initialize();
        let plan = two_camera_plan();

        let mut capture = orchestrator.run_cooperative(&plan).unwrap();
        assert_eq!(capture.label().len(), "20240101_120000".len());
        assert!(capture.next().unwrap().is_ok());
        capture.cancel();
        assert_eq!(capture.remaining(), 0);
        assert!(capture.next().is_none());
        assert_eq!(capture.written(), 1);
    }

    #[test]
    fn write_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        // a regular file where the output directory should be
        fs::write(dir.path().join("blocked"), b"").unwrap();
        settings.output_dir = dir.path().join("blocked");
        let mut orchestrator = CaptureOrchestrator::new(FlatBackend::default(), RawEncoder, settings);
        orchestrator.initialize();

        match orchestrator.run_blocking(&two_camera_plan(), "0000") {
            Err(CaptureError::Io { path, .. }) => assert_eq!(path, dir.path().join("blocked")),
            other => panic!("expected an io error, got {:?}", other),
        }
    }

    #[test]
    fn png_capture_of_software_renderer() {
        use crate::render::{Lens, SoftwareRenderer};

        let dir = tempfile::tempdir().unwrap();
        let renderer = SoftwareRenderer::new(Lens::default()).with_background_color([0, 0, 40]);
        let mut settings = settings(dir.path());
        settings.width = 5;
        settings.height = 5;
        let mut orchestrator = CaptureOrchestrator::new(renderer, PngEncoder, settings);
        orchestrator.initialize();
        orchestrator
            .scene_mut()
            .replace_points(&PointCloudFrame::new(vec![[0.0; 3]], vec![[200, 10, 10, 255]]));

        let ring = RingConfig {
            name: "Flat".to_string(),
            camera_count: 1,
            height: 0.0,
            ..Default::default()
        };
        let shots = plan(&[ring], Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(orchestrator.run_blocking(&shots, "0000").unwrap(), 1);

        let image = image::open(dir.path().join("out/test_0000_Flat_00.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(image.dimensions(), (5, 5));
        assert_eq!(image.get_pixel(2, 2), &Rgb([200, 10, 10]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 40]));
    }
}
