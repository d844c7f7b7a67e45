//! Nice `aonorm` output formatting.

use std::fmt;

use log;

const AONORM_BANNER_LENGTH: usize = 79;

/// Logs a warning to the `aonorm-output` logger.
macro_rules! aonorm_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "aonorm-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `aonorm-output` logger.
macro_rules! aonorm_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "aonorm-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {aonorm_output, aonorm_warn};

/// Logs a nicely formatted section title to the `aonorm-output` logger.
pub fn log_title(title: &str) {
    let length = title.chars().count().max(AONORM_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    aonorm_output!("┌──{bar}──┐");
    aonorm_output!("│§ {title:^length$} §│");
    aonorm_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `aonorm-output` logger.
pub fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    aonorm_output!("{}", subtitle);
    aonorm_output!("{}", bar);
}

/// Logs a nicely formatted macro-section beginning to the `aonorm-output` logger.
pub(crate) fn log_macsec_begin(sectitle: &str) {
    let width = AONORM_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    aonorm_output!("❬❬❬❬❬ [Begin] {sectitle_space:❬<width$}");
}

/// Logs a nicely formatted macro-section ending to the `aonorm-output` logger.
pub(crate) fn log_macsec_end(sectitle: &str) {
    let width = AONORM_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    aonorm_output!("❭❭❭❭❭ [ End ] {sectitle_space:❭<width$}");
}

/// Turns a boolean into a string of `yes` or `no`.
pub fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `aonorm` outputs nicely.
pub trait AoNormOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            aonorm_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> AoNormOutput for T where T: fmt::Debug + fmt::Display {}
