//! Progress reporting and display
//!
//! The batch executor reports through the [`ProgressReporter`] trait so the
//! pipeline does not care whether it runs in a terminal, a log pipe or a test.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

/// Why a record was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentifier,
    MissingSourcePhoto,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::MissingIdentifier => "no WL identifier",
            SkipReason::MissingSourcePhoto => "no silo image",
        })
    }
}

/// Status of a single record being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// Waiting to be processed
    Pending,
    /// Picked up by the executor
    Processing,
    /// Downloading the source photo
    Fetching,
    /// Running image analysis
    Classifying,
    /// Waiting on the image model
    Generating,
    /// Uploading the scene image
    Uploading,
    /// Scene uploaded and URL recorded
    Done,
    /// Not attempted
    Skipped(SkipReason),
    /// Output column was already filled
    AlreadyDone,
    /// Failed with error
    Failed(String),
}

impl EntryStatus {
    fn is_final(&self) -> bool {
        matches!(
            self,
            EntryStatus::Done
                | EntryStatus::Skipped(_)
                | EntryStatus::AlreadyDone
                | EntryStatus::Failed(_)
        )
    }
}

/// Phase of the overall batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPhase {
    /// Checking credentials and building clients
    Initializing,
    /// Loading the product workbook
    ReadingSheet,
    /// Generating scenes row by row
    ProcessingRecords,
    /// Saving the updated workbook
    WritingSheet,
    /// Completed successfully
    Completed,
    /// Failed with error
    Failed(String),
}

impl BatchPhase {
    fn message(&self) -> &'static str {
        match self {
            BatchPhase::Initializing => "🔑 Initializing clients...",
            BatchPhase::ReadingSheet => "📋 Reading product sheet...",
            BatchPhase::ProcessingRecords => "🖼️  Generating scenes...",
            BatchPhase::WritingSheet => "💾 Writing updated sheet...",
            BatchPhase::Completed => "✅ Completed!",
            BatchPhase::Failed(_) => "❌ Failed",
        }
    }
}

/// Progress reporter trait - implement this for different display backends.
pub trait ProgressReporter: Send + Sync {
    /// Set the overall batch phase.
    fn set_phase(&self, phase: BatchPhase);

    /// Register entries to track (call before processing starts).
    fn register_entries(&self, entries: Vec<String>);

    /// Update the status of a specific entry.
    fn update_entry(&self, entry: &str, status: EntryStatus);

    /// Finish and clean up the display.
    fn finish(&self);
}

/// A no-op reporter for when progress display is disabled.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn set_phase(&self, _phase: BatchPhase) {}
    fn register_entries(&self, _entries: Vec<String>) {}
    fn update_entry(&self, _entry: &str, _status: EntryStatus) {}
    fn finish(&self) {}
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Statistics collected during processing.
#[derive(Debug, Default)]
struct Stats {
    total_entries: usize,
    processed: usize,
    skipped: usize,
    already_done: usize,
    errors: usize,
    start_time: Option<Instant>,
}

impl Stats {
    fn started() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record(&mut self, status: &EntryStatus) {
        match status {
            EntryStatus::Done => self.processed += 1,
            EntryStatus::Skipped(_) => self.skipped += 1,
            EntryStatus::AlreadyDone => self.already_done += 1,
            EntryStatus::Failed(_) => self.errors += 1,
            _ => {}
        }
    }

    fn print_summary(&self) {
        let duration = self.start_time.map(|t| t.elapsed()).unwrap_or_default();

        eprintln!();
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("📊 Summary");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("   📄 Records:      {} total", self.total_entries);
        eprintln!("   ✅ Processed:    {}", self.processed);
        eprintln!("   ⏭️  Skipped:      {}", self.skipped);
        eprintln!("   📌 Already done: {}", self.already_done);
        if self.errors > 0 {
            eprintln!("   ❌ Errors:       {}", self.errors);
        }
        eprintln!("   ⏱️  Duration:     {:.2}s", duration.as_secs_f64());
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}

/// Prints nothing while running, only the summary at the end.
pub struct QuietReporter {
    stats: RwLock<Stats>,
}

impl QuietReporter {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(Stats::started()),
        }
    }
}

impl Default for QuietReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for QuietReporter {
    fn set_phase(&self, _phase: BatchPhase) {}

    fn register_entries(&self, entries: Vec<String>) {
        write(&self.stats).total_entries = entries.len();
    }

    fn update_entry(&self, _entry: &str, status: EntryStatus) {
        write(&self.stats).record(&status);
    }

    fn finish(&self) {
        read(&self.stats).print_summary();
    }
}

/// A simple reporter that just prints to stderr (for non-TTY).
pub struct SimpleReporter {
    stats: RwLock<Stats>,
}

impl SimpleReporter {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(Stats::started()),
        }
    }
}

impl Default for SimpleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for SimpleReporter {
    fn set_phase(&self, phase: BatchPhase) {
        match phase {
            BatchPhase::Failed(ref e) => eprintln!("❌ Failed: {e}"),
            phase => eprintln!("{}", phase.message()),
        }
    }

    fn register_entries(&self, entries: Vec<String>) {
        write(&self.stats).total_entries = entries.len();
        eprintln!("   Found {} records", entries.len());
    }

    fn update_entry(&self, entry: &str, status: EntryStatus) {
        write(&self.stats).record(&status);
        match status {
            EntryStatus::Done => eprintln!("   ✓ {entry}"),
            EntryStatus::Skipped(reason) => eprintln!("   - {entry}: skipped ({reason})"),
            EntryStatus::AlreadyDone => eprintln!("   - {entry}: already done"),
            EntryStatus::Failed(ref e) => eprintln!("   ✗ {entry}: {e}"),
            _ => {}
        }
    }

    fn finish(&self) {
        read(&self.stats).print_summary();
    }
}

/// Fancy interactive reporter with progress bars (for TTY).
pub struct FancyReporter {
    multi: indicatif::MultiProgress,
    phase_bar: indicatif::ProgressBar,
    entries: RwLock<HashMap<String, Option<indicatif::ProgressBar>>>,
    main_progress: RwLock<Option<indicatif::ProgressBar>>,
    stats: RwLock<Stats>,
}

impl FancyReporter {
    pub fn new() -> Self {
        let multi = indicatif::MultiProgress::new();
        let phase_bar = multi.add(indicatif::ProgressBar::new_spinner());
        phase_bar.set_style(spinner_style("{spinner:.cyan} {msg}"));
        phase_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            phase_bar,
            entries: RwLock::new(HashMap::new()),
            main_progress: RwLock::new(None),
            stats: RwLock::new(Stats::started()),
        }
    }

    fn status_emoji(status: &EntryStatus) -> &'static str {
        match status {
            EntryStatus::Pending => "⏳",
            EntryStatus::Processing => "⚙️ ",
            EntryStatus::Fetching => "📥",
            EntryStatus::Classifying => "🔎",
            EntryStatus::Generating => "🎨",
            EntryStatus::Uploading => "☁️ ",
            EntryStatus::Done => "✅",
            EntryStatus::Skipped(_) | EntryStatus::AlreadyDone => "⏭️ ",
            EntryStatus::Failed(_) => "❌",
        }
    }

    fn status_detail(status: &EntryStatus) -> String {
        match status {
            EntryStatus::Pending => "pending".to_string(),
            EntryStatus::Processing => "processing".to_string(),
            EntryStatus::Fetching => "downloading photo".to_string(),
            EntryStatus::Classifying => "analyzing photo".to_string(),
            EntryStatus::Generating => "generating scene".to_string(),
            EntryStatus::Uploading => "uploading".to_string(),
            EntryStatus::Done => "done".to_string(),
            EntryStatus::Skipped(reason) => format!("skipped ({reason})"),
            EntryStatus::AlreadyDone => "already done".to_string(),
            EntryStatus::Failed(e) => e.clone(),
        }
    }
}

fn spinner_style(template: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
}

impl Default for FancyReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for FancyReporter {
    fn set_phase(&self, phase: BatchPhase) {
        match phase {
            BatchPhase::Failed(ref e) => {
                self.phase_bar
                    .finish_with_message(format!("❌ Failed: {e}"));
            }
            BatchPhase::Completed => self.phase_bar.finish_with_message(phase.message()),
            phase => self.phase_bar.set_message(phase.message()),
        }
    }

    fn register_entries(&self, entries: Vec<String>) {
        let mut map = write(&self.entries);
        let total = entries.len();
        write(&self.stats).total_entries = total;

        let main_pb = self.multi.add(indicatif::ProgressBar::new(total as u64));
        let bar_style = indicatif::ProgressStyle::default_bar()
            .template("   {bar:40.cyan/blue} {pos}/{len} records")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        main_pb.set_style(bar_style);
        *write(&self.main_progress) = Some(main_pb);

        // bars are created lazily once a record starts
        for entry in entries {
            map.insert(entry, None);
        }
    }

    fn update_entry(&self, entry: &str, status: EntryStatus) {
        let mut map = write(&self.entries);

        if status.is_final() {
            if let Some(Some(pb)) = map.remove(entry) {
                pb.finish_and_clear();
            }
            if let EntryStatus::Failed(ref e) = status {
                self.multi.println(format!("   ✗ {entry}: {e}")).ok();
            }
            if let Some(ref main_pb) = *read(&self.main_progress) {
                main_pb.inc(1);
            }
            write(&self.stats).record(&status);
            return;
        }

        if let Some(entry_slot) = map.get_mut(entry) {
            let message = format!(
                "{} {entry}: {}",
                Self::status_emoji(&status),
                Self::status_detail(&status)
            );
            match entry_slot {
                Some(pb) => pb.set_message(message),
                None => {
                    let pb = self.multi.add(indicatif::ProgressBar::new_spinner());
                    pb.set_style(spinner_style("   {msg}"));
                    pb.set_message(message);
                    pb.enable_steady_tick(Duration::from_millis(100));
                    *entry_slot = Some(pb);
                }
            }
        }
    }

    fn finish(&self) {
        for pb in read(&self.entries).values().flatten() {
            pb.finish_and_clear();
        }
        if let Some(ref main_pb) = *read(&self.main_progress) {
            main_pb.finish_and_clear();
        }
        self.phase_bar.finish_and_clear();
        read(&self.stats).print_summary();
    }
}

/// Create an appropriate reporter based on terminal capabilities.
pub fn create_reporter() -> Arc<dyn ProgressReporter> {
    if console::Term::stderr().is_term() {
        Arc::new(FancyReporter::new())
    } else {
        Arc::new(SimpleReporter::new())
    }
}
