use crate::config::ProgressMode;
use crate::types::ProgressReporter;
use crate::utils::text;
use interfaces::EmptyProgress;
use std::io::Write;
use tracing::info;

const BAR_WIDTH: usize = 40;

/// Pick the reporter once, at startup.
pub fn reporter_for(mode: ProgressMode) -> Box<dyn ProgressReporter> {
    match mode {
        ProgressMode::Bar => Box::new(BarProgress::new(std::io::stderr())),
        ProgressMode::Log => Box::new(LogProgress::default()),
        ProgressMode::None => Box::new(EmptyProgress),
    }
}

/// One log line per item.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    current: usize,
}

impl ProgressReporter for LogProgress {
    fn start(&mut self, total: usize, label: &str) {
        self.total = total;
        self.current = 0;
        info!("{} ({} papers)", label, total);
    }

    fn advance(&mut self, item: &str) {
        self.current += 1;
        info!(
            "[{}/{}] Summarizing: {}",
            self.current,
            self.total,
            text::truncate_chars(item, 60)
        );
    }

    fn finish(&mut self) {}
}

/// Single-line bar, redrawn only when the percentage changes so CI logs stay short.
pub struct BarProgress<W: Write + Send> {
    out: W,
    total: usize,
    current: usize,
    label: String,
    last_percent: Option<usize>,
}

impl<W: Write + Send> BarProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            total: 0,
            current: 0,
            label: String::new(),
            last_percent: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn percent(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.current * 100 / self.total
        }
    }

    fn redraw(&mut self) {
        let percent = self.percent();
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);

        let filled = if self.total == 0 {
            BAR_WIDTH
        } else {
            BAR_WIDTH * self.current / self.total
        };
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

        // Progress output is best effort
        let _ = write!(
            self.out,
            "\r{}: [{}] {}/{} ({}%)",
            self.label, bar, self.current, self.total, percent
        );
        if self.current >= self.total {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressReporter for BarProgress<W> {
    fn start(&mut self, total: usize, label: &str) {
        self.total = total;
        self.current = 0;
        self.label = label.to_string();
        self.last_percent = None;
    }

    fn advance(&mut self, _item: &str) {
        self.current = (self.current + 1).min(self.total);
        self.redraw();
    }

    fn finish(&mut self) {
        if self.current < self.total {
            self.current = self.total;
            self.redraw();
        }
    }
}
