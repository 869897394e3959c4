//! Run logging with progress bar integration
//!
//! Console output routes through one place so messages never tear the
//! indicatif progress bar: while the bar is active, lines go through
//! `ProgressBar::println`. Verbosity has three levels mapped from the
//! CLI's `-v` count.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

/// Output verbosity, from the CLI's `-v` count
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    /// Progress bar, warnings, and the final summary only
    Summary,
    /// Plus per-entity discovery events
    Detailed,
    /// Plus per-request diagnostics
    Debug,
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            _ => VerbosityLevel::Debug,
        }
    }
}

/// Counters accumulated across the run, printed in the final summary
#[derive(Debug, Default)]
pub struct RunMetadata {
    pub entities_processed: usize,
    pub found: usize,
    pub partial: usize,
    pub unresolved: usize,
    pub department_pages_fetched: usize,
    pub emails_extracted: usize,
    pub contacts_extracted: usize,
}

pub struct RunLogger {
    verbosity: VerbosityLevel,
    progress: RwLock<Option<ProgressBar>>,
    metadata: Mutex<RunMetadata>,
    started_at: Instant,
}

impl RunLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress: RwLock::new(None),
            metadata: Mutex::new(RunMetadata::default()),
            started_at: Instant::now(),
        }
    }

    /// Print a line without disturbing an active progress bar
    fn println(&self, message: &str) {
        let guard = self.progress.read().unwrap();
        match guard.as_ref() {
            Some(pb) if !pb.is_finished() => pb.println(message),
            _ => println!("{}", message),
        }
    }

    pub fn info(&self, message: &str) {
        self.println(message);
    }

    pub fn detail(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.println(message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.println(&format!("[debug] {}", message));
        }
    }

    pub fn warn(&self, message: &str) {
        self.println(&format!("Warning: {}", message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Create and register the run progress bar
    pub fn start_progress(&self, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        *self.progress.write().unwrap() = Some(pb);
    }

    pub fn set_progress_message(&self, message: String) {
        if let Some(pb) = self.progress.read().unwrap().as_ref() {
            pb.set_message(message);
        }
    }

    pub fn advance_progress(&self) {
        if let Some(pb) = self.progress.read().unwrap().as_ref() {
            pb.inc(1);
        }
    }

    pub fn finish_progress(&self) {
        if let Some(pb) = self.progress.read().unwrap().as_ref() {
            pb.finish_with_message("done");
        }
    }

    pub fn record_found(&self) {
        let mut m = self.metadata.lock().unwrap();
        m.entities_processed += 1;
        m.found += 1;
    }

    pub fn record_partial(&self) {
        let mut m = self.metadata.lock().unwrap();
        m.entities_processed += 1;
        m.partial += 1;
    }

    pub fn record_unresolved(&self) {
        let mut m = self.metadata.lock().unwrap();
        m.entities_processed += 1;
        m.unresolved += 1;
    }

    pub fn record_extraction(&self, department_pages: usize, emails: usize, contacts: usize) {
        let mut m = self.metadata.lock().unwrap();
        m.department_pages_fetched += department_pages;
        m.emails_extracted += emails;
        m.contacts_extracted += contacts;
    }

    pub fn log_site_found(&self, entity_name: &str, url: &str) {
        self.detail(&format!("  {} -> {}", entity_name, url));
    }

    pub fn log_site_not_found(&self, entity_name: &str, attempts: usize) {
        self.detail(&format!(
            "  {} -> no site ({} candidates tried), queued for manual research",
            entity_name, attempts
        ));
    }

    pub fn log_department_page(&self, url: &str) {
        self.debug(&format!("department page: {}", url));
    }

    pub fn log_checkpoint_saved(&self, completed: usize) {
        self.detail(&format!("Checkpoint saved ({} entities completed)", completed));
    }

    /// Final summary block, printed after export at every verbosity level
    pub fn print_final_summary(&self) {
        let m = self.metadata.lock().unwrap();
        let elapsed = self.started_at.elapsed();

        println!();
        println!("=== Run Summary ===");
        println!("Entities processed:  {}", m.entities_processed);
        println!("  found:             {}", m.found);
        println!("  partial:           {}", m.partial);
        println!("  unresolved:        {}", m.unresolved);
        println!("Department pages:    {}", m.department_pages_fetched);
        println!("Emails extracted:    {}", m.emails_extracted);
        println!("Contacts extracted:  {}", m.contacts_extracted);
        println!("Elapsed:             {:.1}s", elapsed.as_secs_f64());
    }
}
