use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use twsearch_social::twitter::Progress;

/// Single-line `fetched/target` counter on stderr, mirrored into the log.
#[derive(Debug, Default)]
pub struct StderrProgress {
    target: AtomicUsize,
    fetched: AtomicUsize,
}

impl StderrProgress {
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::Relaxed)
    }

    fn redraw(&self) {
        let mut err = std::io::stderr().lock();
        let _ = write!(
            err,
            "\rfetched {}/{}",
            self.fetched(),
            self.target.load(Ordering::Relaxed)
        );
        let _ = err.flush();
    }
}

impl Progress for StderrProgress {
    fn begin(&self, target: usize) {
        self.target.store(target, Ordering::Relaxed);
        self.fetched.store(0, Ordering::Relaxed);
        self.redraw();
    }

    fn inc(&self, fetched: usize) {
        let total = self.fetched.fetch_add(fetched, Ordering::Relaxed) + fetched;
        tracing::debug!(fetched, total, "progress");
        self.redraw();
    }

    fn finish(&self) {
        let _ = writeln!(std::io::stderr());
    }
}
