// SPDX-License-Identifier: GPL-3.0-or-later
//! The sampling loop: read a frame (retrying a bounded number of times), show it, save it every
//! so often, and keep track of how fast frames are coming in.
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use tracing::{debug, info, trace, warn};

use crate::camera::ThermalCamera;
use crate::image_buffer::{empty_frame, ThermalImage};
use crate::render::ThermalDisplay;

mod clock;
mod rate;
mod retry;
mod settings;
mod snapshot;

pub(crate) use self::clock::{Clock, SystemClock};
pub(crate) use self::settings::{AcquisitionSettings, SnapshotSettings};

use self::rate::SampleRate;
use self::retry::RetryPolicy;
use self::snapshot::SnapshotPolicy;

/// What happened during a single pass through the loop.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CycleOutcome {
    /// A frame was read and displayed.
    Rendered {
        /// Time from the start of the cycle until the display finished redrawing.
        elapsed: Duration,
        /// Average sample rate including this cycle.
        sample_rate: f64,
        /// Where a snapshot was saved, if one was due.
        snapshot: Option<PathBuf>,
    },

    /// Every attempt to read a frame failed, nothing was displayed.
    Abandoned {
        attempts: u32,
        message: Option<String>,
    },
}

pub(crate) struct AcquisitionLoop<C, D, K> {
    camera: C,
    display: D,
    clock: K,
    frame: ThermalImage,
    retry: RetryPolicy,
    snapshot: SnapshotPolicy,
    sample_rate: SampleRate,
}

impl<C, D, K> AcquisitionLoop<C, D, K>
where
    C: ThermalCamera,
    D: ThermalDisplay,
    K: Clock,
{
    pub(crate) fn new(
        camera: C,
        display: D,
        clock: K,
        acquisition: &AcquisitionSettings,
        snapshot: &SnapshotSettings,
    ) -> Self {
        let snapshot = SnapshotPolicy::new(snapshot, clock.now());
        let retry = RetryPolicy::new(acquisition.max_retries);
        debug!(
            max_attempts = retry.max_attempts(),
            snapshot_directory = %snapshot.directory().display(),
            "created acquisition loop"
        );
        Self {
            camera,
            display,
            clock,
            frame: empty_frame(),
            retry,
            snapshot,
            sample_rate: SampleRate::new(),
        }
    }

    /// Run a single cycle.
    ///
    /// Failing to read a frame is not an error; the cycle is abandoned and reported through the
    /// returned [CycleOutcome]. Errors from the display or from saving a snapshot are returned.
    pub(crate) fn run_cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        let start = self.clock.now();
        let retry = self.retry;
        let camera = &mut self.camera;
        let frame = &mut self.frame;
        if let Err(exhausted) = retry.run(|| camera.fetch(frame)) {
            warn!("{}", exhausted);
            return Ok(CycleOutcome::Abandoned {
                attempts: exhausted.attempts,
                message: exhausted.message(),
            });
        }
        self.display
            .show(&self.frame)
            .context("Unable to display frame")?;
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(start);
        let snapshot = self.snapshot_if_due(now)?;
        let sample_rate = self.sample_rate.update(elapsed);
        info!("Sample Rate: {:.1}fps", sample_rate);
        Ok(CycleOutcome::Rendered {
            elapsed,
            sample_rate,
            snapshot,
        })
    }

    fn snapshot_if_due(&mut self, now: Instant) -> anyhow::Result<Option<PathBuf>> {
        if !self.snapshot.is_due(now) {
            return Ok(None);
        }
        let path = self.snapshot.path_for(&self.clock.local_time());
        self.display
            .save(&path)
            .with_context(|| format!("Unable to save snapshot to {}", path.display()))?;
        info!("Saved {}", path.display());
        self.snapshot.mark_saved(now);
        Ok(Some(path))
    }

    /// Run cycles until something fatal happens.
    ///
    /// Each abandoned cycle has already been warned about, a run of them is summarized once frames
    /// come back.
    pub(crate) fn run(&mut self) -> anyhow::Result<()> {
        info!("starting acquisition loop");
        let mut abandoned: u64 = 0;
        loop {
            match self.run_cycle()? {
                CycleOutcome::Rendered {
                    elapsed,
                    sample_rate,
                    snapshot,
                } => {
                    if abandoned > 0 {
                        info!("Frames resumed after {} abandoned cycles", abandoned);
                        abandoned = 0;
                    }
                    trace!(?elapsed, sample_rate, ?snapshot, "cycle finished");
                }
                CycleOutcome::Abandoned { attempts, message } => {
                    abandoned += 1;
                    debug!(attempts, ?message, consecutive = abandoned, "cycle abandoned");
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn display(&self) -> &D {
        &self.display
    }

    pub(crate) fn sample_rate(&self) -> &SampleRate {
        &self.sample_rate
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::io;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use anyhow::anyhow;
    use chrono::{DateTime, Local, NaiveDate, TimeZone};
    use float_cmp::approx_eq;
    use image::Luma;

    use super::{
        AcquisitionLoop, AcquisitionSettings, Clock, CycleOutcome, SnapshotSettings,
    };
    use crate::camera::ThermalCamera;
    use crate::error::ReadError;
    use crate::image_buffer::{ThermalImage, FRAME_HEIGHT, FRAME_WIDTH};
    use crate::render::ThermalDisplay;

    /// A clock that only moves when told to. Clones share the same time.
    #[derive(Clone)]
    struct ManualClock {
        start: Instant,
        offset: Rc<Cell<Duration>>,
        wall_start: DateTime<Local>,
    }

    impl ManualClock {
        fn new() -> Self {
            let wall_start = Local
                .from_local_datetime(
                    &NaiveDate::from_ymd_opt(2024, 5, 1)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                )
                .single()
                .unwrap();
            Self {
                start: Instant::now(),
                offset: Rc::new(Cell::new(Duration::ZERO)),
                wall_start,
            }
        }

        fn advance(&self, amount: Duration) {
            self.offset.set(self.offset.get() + amount);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + self.offset.get()
        }

        fn local_time(&self) -> DateTime<Local> {
            self.wall_start + chrono::Duration::from_std(self.offset.get()).unwrap()
        }
    }

    type Step = Result<f32, ReadError>;

    /// Plays back a script of fetch results. Each successful fetch fills the frame with a ramp
    /// starting at the given temperature, and takes `fetch_time` on the clock.
    struct ScriptedCamera {
        steps: Rc<RefCell<VecDeque<Step>>>,
        fetches: Rc<Cell<usize>>,
        clock: ManualClock,
        fetch_time: Duration,
    }

    impl ThermalCamera for ScriptedCamera {
        fn fetch(&mut self, frame: &mut ThermalImage) -> Result<(), ReadError> {
            self.fetches.set(self.fetches.get() + 1);
            self.clock.advance(self.fetch_time);
            let step = self
                .steps
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ReadError::Transport(anyhow!("script finished"))));
            let base = step?;
            for (x, _, pixel) in frame.enumerate_pixels_mut() {
                *pixel = Luma([base + x as f32]);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<ThermalImage>,
        saved: RefCell<Vec<PathBuf>>,
        /// Fail every show once this many frames have been shown.
        fail_after: Option<usize>,
    }

    impl RecordingDisplay {
        fn failing_after(count: usize) -> Self {
            Self {
                fail_after: Some(count),
                ..Self::default()
            }
        }
    }

    impl ThermalDisplay for RecordingDisplay {
        fn show(&mut self, frame: &ThermalImage) -> anyhow::Result<()> {
            if self.fail_after.map_or(false, |limit| self.shown.len() >= limit) {
                return Err(anyhow!("display went away"));
            }
            self.shown.push(frame.clone());
            Ok(())
        }

        fn save(&self, path: &Path) -> anyhow::Result<()> {
            self.saved.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a fmt subscriber writing into a buffer, returning its result and the log lines.
    fn capture_logs<T, F: FnOnce() -> T>(f: F) -> (T, Vec<String>) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, output.lines().map(str::to_string).collect())
    }

    fn count_matching(lines: &[String], needle: &str) -> usize {
        lines.iter().filter(|line| line.contains(needle)).count()
    }

    struct Harness {
        steps: Rc<RefCell<VecDeque<Step>>>,
        fetches: Rc<Cell<usize>>,
        clock: ManualClock,
        acquisition: AcquisitionLoop<ScriptedCamera, RecordingDisplay, ManualClock>,
    }

    impl Harness {
        fn new(fetch_time: Duration) -> Self {
            Self::with_display(fetch_time, RecordingDisplay::default())
        }

        fn with_display(fetch_time: Duration, display: RecordingDisplay) -> Self {
            let clock = ManualClock::new();
            let steps = Rc::new(RefCell::new(VecDeque::new()));
            let fetches = Rc::new(Cell::new(0));
            let camera = ScriptedCamera {
                steps: Rc::clone(&steps),
                fetches: Rc::clone(&fetches),
                clock: clock.clone(),
                fetch_time,
            };
            let acquisition = AcquisitionLoop::new(
                camera,
                display,
                clock.clone(),
                &AcquisitionSettings::default(),
                &SnapshotSettings::default(),
            );
            Self {
                steps,
                fetches,
                clock,
                acquisition,
            }
        }

        fn script<I: IntoIterator<Item = Step>>(&self, steps: I) {
            self.steps.borrow_mut().extend(steps);
        }

        fn transport_error(message: &str) -> Step {
            Err(ReadError::Transport(anyhow!(message.to_string())))
        }

        fn shown(&self) -> &[ThermalImage] {
            &self.acquisition.display().shown
        }

        fn saved(&self) -> Vec<PathBuf> {
            self.acquisition.display().saved.borrow().clone()
        }
    }

    #[test]
    fn success_after_three_failures() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script(vec![
            Harness::transport_error("NACK"),
            Err(ReadError::InvalidFrame),
            Harness::transport_error("NACK"),
            Ok(20.0),
        ]);
        let outcome = harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.fetches.get(), 4);
        assert_eq!(harness.shown().len(), 1);
        assert_eq!(harness.acquisition.sample_rate().count(), 1);
        match outcome {
            CycleOutcome::Rendered {
                elapsed,
                sample_rate,
                snapshot,
            } => {
                // Every attempt counts towards the cycle time
                assert_eq!(elapsed, Duration::from_millis(400));
                assert!(approx_eq!(f64, sample_rate, 2.5, ulps = 2));
                assert_eq!(snapshot, None);
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn abandoned_after_five_transport_errors() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script((1..=5).map(|n| Harness::transport_error(&format!("failure {}", n))));
        harness.script(vec![Ok(20.0)]);

        let outcome = harness.acquisition.run_cycle().unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Abandoned {
                attempts: 5,
                message: Some("failure 5".to_string()),
            }
        );
        assert_eq!(harness.fetches.get(), 5);
        assert!(harness.shown().is_empty());
        assert_eq!(harness.acquisition.sample_rate().count(), 0);

        // The loop carries on with the next cycle
        let outcome = harness.acquisition.run_cycle().unwrap();
        assert!(matches!(outcome, CycleOutcome::Rendered { .. }));
        assert_eq!(harness.fetches.get(), 6);
        assert_eq!(harness.shown().len(), 1);
        assert_eq!(harness.acquisition.sample_rate().count(), 1);
    }

    #[test]
    fn abandoned_on_invalid_frame_has_no_message() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script(vec![
            Harness::transport_error("NACK"),
            Harness::transport_error("NACK"),
            Harness::transport_error("NACK"),
            Harness::transport_error("NACK"),
            Err(ReadError::InvalidFrame),
        ]);
        let outcome = harness.acquisition.run_cycle().unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Abandoned {
                attempts: 5,
                message: None,
            }
        );
    }

    #[test]
    fn abandoned_cycles_keep_previous_frame() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script(vec![Ok(30.0)]);
        harness.script((0..5).map(|_| Err(ReadError::InvalidFrame)));
        harness.acquisition.run_cycle().unwrap();
        harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.shown().len(), 1);
        assert_eq!(harness.acquisition.frame.get_pixel(0, 0).0[0], 30.0);
    }

    #[test]
    fn rate_is_count_over_total() {
        let mut harness = Harness::new(Duration::from_millis(250));
        harness.script(vec![Ok(20.0), Ok(21.0)]);
        harness.acquisition.run_cycle().unwrap();
        harness.clock.advance(Duration::from_millis(1750));
        let outcome = harness.acquisition.run_cycle().unwrap();
        // Time outside of a cycle isn't counted
        assert_eq!(harness.acquisition.sample_rate().total(), Duration::from_millis(500));
        match outcome {
            CycleOutcome::Rendered { sample_rate, .. } => assert_eq!(sample_rate, 4.0),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn displays_latest_frame() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script(vec![Ok(20.0), Ok(35.0)]);
        harness.acquisition.run_cycle().unwrap();
        harness.acquisition.run_cycle().unwrap();
        let shown = harness.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[1].dimensions(), (FRAME_WIDTH, FRAME_HEIGHT));
        assert_eq!(shown[1].get_pixel(0, 0).0[0], 35.0);
        assert_eq!(shown[1].get_pixel(FRAME_WIDTH - 1, 0).0[0], 35.0 + 31.0);
    }

    #[test]
    fn snapshot_after_interval() {
        let mut harness = Harness::new(Duration::ZERO);
        harness.script(vec![Ok(20.0), Ok(20.0)]);
        let first = harness.acquisition.run_cycle().unwrap();
        assert!(matches!(first, CycleOutcome::Rendered { snapshot: None, .. }));

        harness.clock.advance(Duration::from_secs(61));
        let second = harness.acquisition.run_cycle().unwrap();
        let expected = PathBuf::from("./thermal_image_20240501_120101.jpg");
        match second {
            CycleOutcome::Rendered { snapshot, .. } => {
                assert_eq!(snapshot, Some(expected.clone()))
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
        assert_eq!(harness.saved(), vec![expected]);
    }

    #[test]
    fn snapshot_interval_restarts_from_save() {
        let mut harness = Harness::new(Duration::ZERO);
        harness.script((0..4).map(|_| Ok(20.0)));
        harness.clock.advance(Duration::from_secs(90));
        harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.saved().len(), 1);

        // 59 seconds after the last save, not due yet
        harness.clock.advance(Duration::from_secs(59));
        harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.saved().len(), 1);

        harness.clock.advance(Duration::from_secs(1));
        harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.saved().len(), 2);
        assert_eq!(
            harness.saved()[1],
            PathBuf::from("./thermal_image_20240501_120230.jpg")
        );

        harness.acquisition.run_cycle().unwrap();
        assert_eq!(harness.saved().len(), 2);
    }

    #[test]
    fn no_snapshot_on_abandoned_cycle() {
        let mut harness = Harness::new(Duration::ZERO);
        harness.script((0..5).map(|_| Err(ReadError::InvalidFrame)));
        harness.clock.advance(Duration::from_secs(120));
        let outcome = harness.acquisition.run_cycle().unwrap();
        assert!(matches!(outcome, CycleOutcome::Abandoned { .. }));
        assert!(harness.saved().is_empty());
    }

    #[test]
    fn display_errors_are_fatal() {
        let mut harness = Harness::with_display(Duration::ZERO, RecordingDisplay::failing_after(0));
        harness.script(vec![Ok(20.0)]);
        assert!(harness.acquisition.run_cycle().is_err());
        assert_eq!(harness.acquisition.sample_rate().count(), 0);
    }

    #[test]
    fn run_stops_on_fatal_error() {
        let mut harness = Harness::with_display(Duration::ZERO, RecordingDisplay::failing_after(0));
        // Abandoned cycles don't stop the loop, the display failure does.
        harness.script((0..10).map(|_| Err(ReadError::InvalidFrame)));
        harness.script(vec![Ok(20.0)]);
        assert!(harness.acquisition.run().is_err());
        assert_eq!(harness.fetches.get(), 11);
    }

    #[test]
    fn abandonment_logged_once() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script((1..=5).map(|n| Harness::transport_error(&format!("failure {}", n))));
        let (outcome, lines) = capture_logs(|| harness.acquisition.run_cycle().unwrap());
        assert!(matches!(outcome, CycleOutcome::Abandoned { attempts: 5, .. }));
        assert_eq!(count_matching(&lines, "Failed after"), 1, "{:#?}", lines);
        assert_eq!(
            count_matching(&lines, "WARN"),
            1,
            "Individual failures should be below warning level: {:#?}",
            lines
        );
        assert_eq!(
            count_matching(&lines, "Failed after 5 retries with error: failure 5"),
            1
        );
        assert_eq!(count_matching(&lines, "Sample Rate"), 0);
    }

    #[test]
    fn invalid_frame_abandonment_logged_without_message() {
        let mut harness = Harness::new(Duration::ZERO);
        harness.script((0..5).map(|_| Err(ReadError::InvalidFrame)));
        let (_, lines) = capture_logs(|| harness.acquisition.run_cycle().unwrap());
        assert_eq!(count_matching(&lines, "Failed after 5 retries"), 1);
        assert_eq!(count_matching(&lines, "with error"), 0);
    }

    #[test]
    fn sample_rate_logged() {
        let mut harness = Harness::new(Duration::from_millis(100));
        harness.script(vec![
            Harness::transport_error("NACK"),
            Err(ReadError::InvalidFrame),
            Harness::transport_error("NACK"),
            Ok(20.0),
        ]);
        let (_, lines) = capture_logs(|| harness.acquisition.run_cycle().unwrap());
        assert_eq!(count_matching(&lines, "Sample Rate: 2.5fps"), 1, "{:#?}", lines);
        assert_eq!(count_matching(&lines, "Failed after"), 0);
    }

    #[test]
    fn run_summarizes_abandoned_cycles() {
        let mut harness =
            Harness::with_display(Duration::from_millis(100), RecordingDisplay::failing_after(1));
        harness.script((0..10).map(|_| Err(ReadError::InvalidFrame)));
        harness.script(vec![Ok(20.0), Ok(21.0)]);
        let (result, lines) = capture_logs(|| harness.acquisition.run());
        assert!(result.is_err());
        assert_eq!(harness.shown().len(), 1);
        assert_eq!(count_matching(&lines, "Failed after 5 retries"), 2);
        assert_eq!(
            count_matching(&lines, "Frames resumed after 2 abandoned cycles"),
            1,
            "{:#?}",
            lines
        );
    }
}
