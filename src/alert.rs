//! Threshold alerts for sharp negative moves.
//!
//! [`evaluate`] maps a record's bid change onto a four-step severity
//! ladder. [`AlertMonitor`] remembers the last value it saw so a sound
//! plays once per change of the observed value rather than on every poll.
//! Playback itself goes through an [`AlertSink`].

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use rust_decimal::Decimal;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::models::DerivedRecord;

/// Severity of a negative move, from 1 (mild) to 4 (severe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl AlertLevel {
    /// Numeric severity in `1..=4`.
    pub fn as_u8(self) -> u8 {
        match self {
            AlertLevel::Level1 => 1,
            AlertLevel::Level2 => 2,
            AlertLevel::Level3 => 3,
            AlertLevel::Level4 => 4,
        }
    }

    /// Maps a percent change onto the ladder; the most negative bound
    /// that matches wins.
    pub fn for_change(change: Decimal) -> Option<Self> {
        if change <= Decimal::from(-20) {
            Some(AlertLevel::Level4)
        } else if change <= Decimal::from(-15) {
            Some(AlertLevel::Level3)
        } else if change <= Decimal::from(-10) {
            Some(AlertLevel::Level2)
        } else if change <= Decimal::from(-5) {
            Some(AlertLevel::Level1)
        } else {
            None
        }
    }
}

/// Which record alerts are evaluated against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlertBasis {
    /// Whatever record the table currently shows first.
    #[default]
    DisplayOrder,
    /// The most negative change in the whole dataset, regardless of sort.
    TrueMinimum,
}

impl AlertBasis {
    pub fn label(&self) -> &'static str {
        match self {
            AlertBasis::DisplayOrder => "top row",
            AlertBasis::TrueMinimum => "minimum",
        }
    }

    pub fn toggle(&mut self) {
        *self = match self {
            AlertBasis::DisplayOrder => AlertBasis::TrueMinimum,
            AlertBasis::TrueMinimum => AlertBasis::DisplayOrder,
        };
    }
}

/// Computes the alert level for the top record, if any.
pub fn evaluate(top: Option<&DerivedRecord>, alerts_enabled: bool) -> Option<AlertLevel> {
    if !alerts_enabled {
        return None;
    }
    AlertLevel::for_change(top?.buy_change_percent?)
}

/// Returns the record with the most negative bid change, skipping records
/// whose change is not a number. The first of equal minima wins.
pub fn true_minimum(dataset: &[DerivedRecord]) -> Option<&DerivedRecord> {
    dataset
        .iter()
        .filter(|r| r.buy_change_percent.is_some())
        .min_by_key(|r| r.buy_change_percent)
}

/// Fires alerts only when the observed top value changes.
#[derive(Debug, Default)]
pub struct AlertMonitor {
    last_seen: Option<Option<Decimal>>,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current top record and returns a level to play if the
    /// observed value differs from the previous observation.
    ///
    /// The value is tracked even while alerts are disabled, so re-enabling
    /// does not replay an alert for a move that was already seen.
    pub fn observe(&mut self, top: Option<&DerivedRecord>, alerts_enabled: bool) -> Option<AlertLevel> {
        let value = top.and_then(|r| r.buy_change_percent);
        if self.last_seen == Some(value) {
            return None;
        }
        self.last_seen = Some(value);

        let level = evaluate(top, alerts_enabled);
        if let (Some(level), Some(record)) = (level, top) {
            debug!(symbol = record.symbol(), level = level.as_u8(), change = ?value, "Alert triggered");
        }
        level
    }
}

/// Capability to play an alert sound.
///
/// Implementations must not block and must swallow their own errors.
pub trait AlertSink: Send + Sync {
    fn play(&self, level: AlertLevel);
}

/// Rings the terminal bell once per severity level.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AlertSink for TerminalBell {
    fn play(&self, level: AlertLevel) {
        let bells = "\x07".repeat(usize::from(level.as_u8()));
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(bells.as_bytes()).and_then(|()| stdout.flush()) {
            warn!(error = %e, "Failed to ring terminal bell");
        }
    }
}

/// Plays `sound{level}.mp3` from a directory with an external program.
#[derive(Debug, Clone)]
pub struct SoundCommand {
    program: String,
    sound_dir: PathBuf,
}

impl SoundCommand {
    pub fn new(program: impl Into<String>, sound_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            sound_dir: sound_dir.into(),
        }
    }

    /// Sound file played for a level.
    pub fn sound_file(&self, level: AlertLevel) -> PathBuf {
        self.sound_dir.join(format!("sound{}.mp3", level.as_u8()))
    }
}

impl AlertSink for SoundCommand {
    fn play(&self, level: AlertLevel) {
        let file = self.sound_file(level);
        let spawned = Command::new(&self.program)
            .arg(&file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // Reap the player in the background.
                tokio::spawn(async move {
                    if let Err(e) = child.wait().await {
                        warn!(error = %e, "Alert player failed");
                    }
                });
            }
            Err(e) => {
                warn!(program = %self.program, file = %file.display(), error = %e, "Failed to start alert player");
            }
        }
    }
}
