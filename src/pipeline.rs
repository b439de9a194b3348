//! Orchestration: working copy, sampling, clustering, ranking, and the
//! full-resolution recolor, run as resumable stages.
//!
//! Heavy stages never run back to back inside one call. [`Job::step`] performs a
//! single stage and hands control back, so an interactive host can render
//! progress (or let its event loop breathe) before asking for the next one.

use std::fmt;

use image::RgbaImage;
use log::{debug, info, warn};
use palette::{Lab, Srgb};
use rand::Rng;
use serde::Deserialize;

use crate::color::rgb_to_lab;
use crate::error::{Result, ThemeError};
use crate::kmeans::kmeans;
use crate::quantize::quantize_in_place;
use crate::rank::{PaletteEntry, rank};
use crate::sampler::{stratified_sample, working_copy};

/// Tuning knobs for one extraction run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Requested palette size
    pub k: usize,
    /// Cap on clustering rounds
    pub max_iterations: usize,
    /// Long-edge pixel cap of the working copy used for seeding
    pub sample_cap: u32,
    /// Upper bound on stratified samples drawn from the working copy
    pub max_samples: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            k: 16,
            max_iterations: 16,
            sample_cap: 256,
            max_samples: 4096,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("k", self.k),
            ("max_iterations", self.max_iterations),
            ("sample_cap", self.sample_cap as usize),
            ("max_samples", self.max_samples),
        ];
        for (name, value) in checks {
            if value < 1 {
                return Err(ThemeError::InvalidOption { name, value });
            }
        }
        Ok(())
    }
}

/// Wrap raw RGBA bytes, checking that the length matches the dimensions.
pub fn pixel_buffer(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage> {
    let expected = width as usize * height as usize * 4;
    let actual = data.len();
    RgbaImage::from_raw(width, height, data).ok_or(ThemeError::BufferSize {
        width,
        height,
        expected,
        actual,
    })
}

/// A heavy stage of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Sample,
    Cluster,
    Recolor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Sample => write!(f, "sampling"),
            Stage::Cluster => write!(f, "clustering"),
            Stage::Recolor => write!(f, "recoloring"),
        }
    }
}

/// Result of a finished run.
#[derive(Clone, Debug)]
pub struct Extraction {
    /// Full-resolution image with every opaque pixel recolored. When the source
    /// had no opaque pixels this is the source, unchanged.
    pub image: RgbaImage,
    /// Palette, most dominant color first. Empty when nothing was opaque.
    pub palette: Vec<PaletteEntry>,
    /// Clustering rounds performed
    pub iterations: usize,
    /// Number of sampled points fed to clustering
    pub samples: usize,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    pub fn colors(&self) -> Vec<Srgb<u8>> {
        self.palette.iter().map(|e| e.color).collect()
    }
}

/// What a call to [`Job::step`] produced.
#[derive(Debug)]
pub enum Step {
    /// A stage completed; the named one runs on the next call
    Yield(Stage),
    Done(Extraction),
}

enum State {
    Sample {
        source: RgbaImage,
    },
    Cluster {
        source: RgbaImage,
        points: Vec<Lab>,
    },
    Recolor {
        source: RgbaImage,
        palette: Vec<PaletteEntry>,
        iterations: usize,
        samples: usize,
    },
    Finished,
}

/// One extraction run, advanced a stage at a time.
pub struct Job<R> {
    options: Options,
    rng: R,
    state: State,
}

impl<R: Rng> Job<R> {
    /// Validate `options` and prepare a run over `source`. Nothing heavy
    /// happens until the first [`step`](Job::step).
    pub fn new(source: RgbaImage, options: Options, rng: R) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            rng,
            state: State::Sample { source },
        })
    }

    /// The stage the next call to [`step`](Job::step) will run, or `None` once
    /// the job has finished.
    pub fn next_stage(&self) -> Option<Stage> {
        match self.state {
            State::Sample { .. } => Some(Stage::Sample),
            State::Cluster { .. } => Some(Stage::Cluster),
            State::Recolor { .. } => Some(Stage::Recolor),
            State::Finished => None,
        }
    }

    /// Run exactly one stage.
    pub fn step(&mut self) -> Result<Step> {
        match std::mem::replace(&mut self.state, State::Finished) {
            State::Sample { source } => {
                let work = working_copy(&source, self.options.sample_cap);
                let sampled = stratified_sample(&work, self.options.max_samples, &mut self.rng);
                debug!(
                    "sampled {} of {}x{} working pixels (source {}x{})",
                    sampled.len(),
                    work.width(),
                    work.height(),
                    source.width(),
                    source.height()
                );
                let points: Vec<Lab> = sampled
                    .iter()
                    .map(|px| rgb_to_lab(Srgb::new(px[0], px[1], px[2])))
                    .collect();
                self.state = State::Cluster { source, points };
                Ok(Step::Yield(Stage::Cluster))
            }
            State::Cluster { source, points } => {
                let clustering = kmeans(
                    &points,
                    self.options.k,
                    self.options.max_iterations,
                    &mut self.rng,
                );
                if clustering.is_empty() {
                    debug!("no opaque pixels, nothing to extract");
                    return Ok(Step::Done(Extraction {
                        image: source,
                        palette: Vec::new(),
                        iterations: 0,
                        samples: 0,
                    }));
                }
                let palette = rank(&clustering.centroids, &clustering.counts);
                self.state = State::Recolor {
                    source,
                    palette,
                    iterations: clustering.iterations,
                    samples: points.len(),
                };
                Ok(Step::Yield(Stage::Recolor))
            }
            State::Recolor {
                mut source,
                palette,
                iterations,
                samples,
            } => {
                let colors: Vec<Srgb<u8>> = palette.iter().map(|e| e.color).collect();
                quantize_in_place(&mut source, &colors);
                info!(
                    "extracted {} colors from {} samples in {} iteration(s)",
                    palette.len(),
                    samples,
                    iterations
                );
                Ok(Step::Done(Extraction {
                    image: source,
                    palette,
                    iterations,
                    samples,
                }))
            }
            State::Finished => Err(ThemeError::processing("job already finished")),
        }
    }
}

/// Run a whole extraction, calling `on_stage` before each heavy stage.
pub fn run_with_progress<R, F>(
    source: RgbaImage,
    options: Options,
    rng: R,
    mut on_stage: F,
) -> Result<Extraction>
where
    R: Rng,
    F: FnMut(Stage),
{
    let mut job = Job::new(source, options, rng)?;
    on_stage(Stage::Sample);
    loop {
        match job.step()? {
            Step::Yield(next) => on_stage(next),
            Step::Done(extraction) => return Ok(extraction),
        }
    }
}

/// Run a whole extraction without progress reporting.
pub fn run<R: Rng>(source: RgbaImage, options: Options, rng: R) -> Result<Extraction> {
    run_with_progress(source, options, rng, |_| {})
}

/// Observable state of an [`Extractor`] after a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    /// No run in flight
    Idle,
    /// A stage completed; the named one is next
    Pending(Stage),
    /// The run finished and its result is now published
    Published,
    /// The run finished without opaque pixels; nothing was published
    Empty,
    /// The run failed; the previous publication stands
    Failed,
}

/// Owns at most one in-flight run and the last published result.
///
/// Starting a run while another is in flight discards the older one. A result
/// becomes visible through [`published`](Extractor::published) only when a run
/// completes with a non-empty palette, and it replaces the previous result in
/// one move.
pub struct Extractor<R> {
    job: Option<Job<R>>,
    published: Option<Extraction>,
    failure: Option<ThemeError>,
}

impl<R: Rng> Default for Extractor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Extractor<R> {
    pub fn new() -> Self {
        Self {
            job: None,
            published: None,
            failure: None,
        }
    }

    /// Begin a new run. Invalid options are reported here and leave any
    /// in-flight run alone.
    pub fn start(&mut self, source: RgbaImage, options: Options, rng: R) -> Result<()> {
        let job = Job::new(source, options, rng)?;
        if self.job.is_some() {
            warn!("superseding an in-flight extraction");
        }
        self.job = Some(job);
        self.failure = None;
        Ok(())
    }

    /// Advance the in-flight run by one stage.
    pub fn poll(&mut self) -> Poll {
        let Some(job) = self.job.as_mut() else {
            return Poll::Idle;
        };

        match job.step() {
            Ok(Step::Yield(next)) => Poll::Pending(next),
            Ok(Step::Done(extraction)) => {
                self.job = None;
                if extraction.is_empty() {
                    Poll::Empty
                } else {
                    self.published = Some(extraction);
                    Poll::Published
                }
            }
            Err(err) => {
                warn!("extraction failed: {err:?}");
                self.job = None;
                self.failure = Some(err);
                Poll::Failed
            }
        }
    }

    /// Stage the in-flight run will execute next.
    pub fn stage(&self) -> Option<Stage> {
        self.job.as_ref().and_then(Job::next_stage)
    }

    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    pub fn published(&self) -> Option<&Extraction> {
        self.published.as_ref()
    }

    /// Error from the most recent run, cleared by the next [`start`](Extractor::start).
    pub fn failure(&self) -> Option<&ThemeError> {
        self.failure.as_ref()
    }
}
