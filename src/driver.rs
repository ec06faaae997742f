//! Drives a dataset run: one capture pass per point cloud frame, in natural file order.
//!
//! The host calls [FrameDriver::tick] once per scheduling step until it reports
//! [DriverState::Finished]. Each step decodes the next frame, hands it to the scene and runs a
//! blocking capture pass labelled with the zero padded frame counter.

use std::collections::VecDeque;
use std::path::PathBuf;

use log::{error, info, warn};
use thiserror::Error;

use crate::capture::{plan, CaptureError, CaptureOrchestrator, PlanError, RingConfig, Target};
use crate::formats::PointCloudFrame;
use crate::ply::{read_ply_file, PlyReadError};
use crate::render::{Encoder, RenderBackend, Scene};
use crate::utils::{find_sorted_files, FileFilter};

type Result<T> = std::result::Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("tick() called before initialize()")]
    NotInitialized,
    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: PlyReadError,
    },
    #[error("Failed to plan cameras for {path:?}: {source}")]
    Plan {
        path: PathBuf,
        #[source]
        source: PlanError,
    },
    #[error("Failed to capture {path:?}: {source}")]
    Capture {
        path: PathBuf,
        #[source]
        source: CaptureError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Loading,
    Capturing,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub input_dir: PathBuf,
    pub filter: FileFilter,
    pub rings: Vec<RingConfig>,
    pub target: Target,
    /// Same factor the scene applies to positions, used to resolve [Target::Center]
    pub scale: f32,
    /// Log and skip frames that fail to decode instead of stopping the run
    pub skip_failed_frames: bool,
}

impl DriverConfig {
    pub fn new<P: Into<PathBuf>>(input_dir: P) -> Self {
        Self {
            input_dir: input_dir.into(),
            filter: FileFilter::extension("ply"),
            rings: vec![RingConfig::default()],
            target: Target::default(),
            scale: 1.0,
            skip_failed_frames: false,
        }
    }
}

pub struct FrameDriver<B, E> {
    config: DriverConfig,
    orchestrator: CaptureOrchestrator<B, E>,
    queue: VecDeque<PathBuf>,
    frame: Option<PointCloudFrame>,
    frame_counter: u32,
    total_frames: usize,
    state: DriverState,
    initialized: bool,
}

impl<B: RenderBackend, E: Encoder> FrameDriver<B, E> {
    pub fn new(config: DriverConfig, orchestrator: CaptureOrchestrator<B, E>) -> Self {
        Self {
            config,
            orchestrator,
            queue: VecDeque::new(),
            frame: None,
            frame_counter: 0,
            total_frames: 0,
            state: DriverState::Idle,
            initialized: false,
        }
    }

    /// Discovers the input files and acquires the capture resources.
    pub fn initialize(&mut self) {
        self.queue = find_sorted_files(&self.config.input_dir, &self.config.filter).into();
        self.total_frames = self.queue.len();
        if self.queue.is_empty() {
            warn!("No frames to capture in {:?}", self.config.input_dir);
        }
        self.orchestrator.initialize();
        self.frame_counter = 0;
        self.state = DriverState::Idle;
        self.initialized = true;
    }

    /// Processes the next frame, if any. Returns [DriverState::Idle] when there may be more work
    /// and [DriverState::Finished] once the queue is drained.
    pub fn tick(&mut self) -> Result<DriverState> {
        if self.state == DriverState::Finished {
            return Ok(DriverState::Finished);
        }
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        let Some(path) = self.queue.pop_front() else {
            info!("Captured {} frames", self.frame_counter);
            self.state = DriverState::Finished;
            return Ok(self.state);
        };

        match self.process(path) {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                self.state = DriverState::Finished;
                Err(e)
            }
        }
    }

    fn process(&mut self, path: PathBuf) -> Result<DriverState> {
        self.state = DriverState::Loading;
        // release the previous frame before the next one is allocated
        self.frame = None;
        let frame = match read_ply_file(&path) {
            Ok(frame) => frame,
            Err(source) if self.config.skip_failed_frames => {
                error!("Skipping {:?}: {}", path, source);
                return Ok(DriverState::Idle);
            }
            Err(source) => return Err(DriverError::Decode { path, source }),
        };

        let target = self.config.target.resolve(&frame, self.config.scale);
        let shots = match plan(&self.config.rings, target) {
            Ok(shots) => shots,
            Err(source) => return Err(DriverError::Plan { path, source }),
        };

        self.state = DriverState::Capturing;
        self.orchestrator.scene_mut().replace_points(&frame);
        self.frame = Some(frame);
        let label = format!("{:04}", self.frame_counter);
        if let Err(source) = self.orchestrator.run_blocking(&shots, &label) {
            return Err(DriverError::Capture { path, source });
        }
        self.frame_counter += 1;
        Ok(DriverState::Idle)
    }

    /// Ticks until the run is finished. Returns the number of frames captured.
    pub fn run_to_completion(&mut self) -> Result<u32> {
        while self.tick()? != DriverState::Finished {}
        Ok(self.frame_counter)
    }

    /// Releases the capture resources and drops any pending frames.
    pub fn shutdown(&mut self) {
        self.orchestrator.shutdown();
        self.queue.clear();
        self.frame = None;
        self.state = DriverState::Finished;
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frames captured so far
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Frames found by [initialize](Self::initialize)
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// The frame currently shown in the scene
    pub fn current_frame(&self) -> Option<&PointCloudFrame> {
        self.frame.as_ref()
    }
}
