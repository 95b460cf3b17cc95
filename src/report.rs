use std::io::{self, Write};

use crate::metrics::{EpochMetrics, ErrorReport};

/// Escape sequences decorating the console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub log: &'static str,
    pub accent: &'static str,
    pub success: &'static str,
    pub reset: &'static str,
}

impl Palette {
    /// Bold tags and ANSI colors, for terminals.
    pub const ANSI: Self = Self {
        log: "\x1b[1;34m[LOG]\x1b[0m ",
        accent: "\x1b[36m",
        success: "\x1b[1;32m[SUCCESS]\x1b[0m ",
        reset: "\x1b[0m",
    };

    /// The same tags without escape sequences, for files and pipes.
    pub const PLAIN: Self = Self {
        log: "[LOG] ",
        accent: "",
        success: "[SUCCESS] ",
        reset: "",
    };

    pub fn colored(enabled: bool) -> Self {
        if enabled { Self::ANSI } else { Self::PLAIN }
    }
}

/// What the training loop reports after every epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// One based.
    pub epoch: usize,
    pub num_epochs: usize,
    pub metrics: EpochMetrics,
}

/// Receives the progress of a training run.
pub trait Reporter {
    fn epoch(&mut self, report: &EpochReport) -> io::Result<()>;

    fn finished(&mut self, errors: &ErrorReport) -> io::Result<()>;
}

/// Writes human readable progress blocks to `W`, usually stdout.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    palette: Palette,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(palette: Palette) -> Self {
        Self::new(io::stdout(), palette)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self { out, palette }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn epoch(&mut self, report: &EpochReport) -> io::Result<()> {
        let Palette {
            log, accent, reset, ..
        } = self.palette;
        let EpochReport {
            epoch,
            num_epochs,
            metrics: m,
        } = report;

        writeln!(self.out, "{log}{accent}Epoch {epoch}/{num_epochs}{reset}")?;
        writeln!(self.out, "\t\tLoss: {:.4}", m.loss)?;
        writeln!(self.out, "\t\tAccuracy: {:.4}", m.accuracy)?;
        writeln!(self.out, "\t\tPrecision: {:.4}", m.precision)?;
        writeln!(self.out, "\t\tRecall: {:.4}", m.recall)?;
        writeln!(self.out, "\t\tF1-Score: {:.4}", m.f1)?;
        self.out.flush()
    }

    fn finished(&mut self, errors: &ErrorReport) -> io::Result<()> {
        let Palette { success, .. } = self.palette;

        writeln!(self.out, "{success}Training complete!")?;
        writeln!(self.out, "\t\tFinal Top-1 Error: {:.4}", errors.top1_error)?;
        writeln!(self.out, "\t\tFinal Top-5 Error: {:.4}", errors.top5_error)?;
        self.out.flush()
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn epoch(&mut self, report: &EpochReport) -> io::Result<()> {
        (**self).epoch(report)
    }

    fn finished(&mut self, errors: &ErrorReport) -> io::Result<()> {
        (**self).finished(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed<F>(f: F) -> String
    where
        F: FnOnce(&mut ConsoleReporter<Vec<u8>>) -> io::Result<()>,
    {
        let mut reporter = ConsoleReporter::new(Vec::new(), Palette::PLAIN);
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn epoch_block() {
        let report = EpochReport {
            epoch: 3,
            num_epochs: 10,
            metrics: EpochMetrics {
                loss: 0.123456,
                accuracy: 0.5,
                precision: 0.25,
                recall: 0.5,
                f1: 1. / 3.,
            },
        };

        let out = printed(|r| r.epoch(&report));

        assert_eq!(
            out,
            "[LOG] Epoch 3/10\n\
             \t\tLoss: 0.1235\n\
             \t\tAccuracy: 0.5000\n\
             \t\tPrecision: 0.2500\n\
             \t\tRecall: 0.5000\n\
             \t\tF1-Score: 0.3333\n"
        );
    }

    #[test]
    fn final_block() {
        let errors = ErrorReport {
            top1_error: 1.,
            top5_error: 0.,
        };

        let out = printed(|r| r.finished(&errors));

        assert_eq!(
            out,
            "[SUCCESS] Training complete!\n\
             \t\tFinal Top-1 Error: 1.0000\n\
             \t\tFinal Top-5 Error: 0.0000\n"
        );
    }

    #[test]
    fn ansi_palette_colors_the_epoch_header() {
        let mut reporter = ConsoleReporter::new(Vec::new(), Palette::colored(true));
        let report = EpochReport {
            epoch: 1,
            num_epochs: 1,
            metrics: EpochMetrics::default(),
        };

        reporter.epoch(&report).unwrap();
        let out = String::from_utf8(reporter.into_inner()).unwrap();

        assert!(out.starts_with("\x1b[1;34m[LOG]\x1b[0m \x1b[36mEpoch 1/1\x1b[0m\n"));
    }
}
