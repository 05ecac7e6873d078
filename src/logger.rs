//! Terminal output: prefixed log lines and in-place progress bars.
//!
//! ```ignore
//! log!("build"; "rendering {} pages", count);
//!
//! if let Some(progress) = ProgressBars::new_filtered(&[("render", units)]) {
//!     progress.inc_by_name("render");
//!     progress.finish();
//! }
//! ```
//!
//! Log lines printed while bars are active are inserted above them, the bars
//! are redrawn below.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Rows currently held by progress bars.
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Layout
// ============================================================================
//
// "[render] [████░░░░] 42/100"
//  ^------^ ^-------^ ^----^
//  prefix   bar       count

const BRACKET_LEN: usize = 2;
const SPACE_AFTER_PREFIX: usize = 1;
/// " []" around the bar.
const BAR_WRAPPER_LEN: usize = 3;
const SPACE_BEFORE_COUNT: usize = 1;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Display length of `[module] `.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Terminal width, 120 columns when unknown.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print one prefixed line, truncated to the terminal width unless it spans
/// several lines.
#[allow(clippy::cast_possible_truncation)]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
    };
    writeln!(stdout, "{prefix} {message}").ok();

    for _ in 0..bar_count {
        writeln!(stdout).ok();
    }
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "render" => prefix.bright_blue().bold(),
        "build" | "tree" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max_len` bytes on a char boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `850ms`, `2.41s` or `1m 03s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    match millis {
        0..1_000 => format!("{millis}ms"),
        1_000..60_000 => format!("{:.2}s", elapsed.as_secs_f64()),
        _ => {
            let secs = elapsed.as_secs();
            format!("{}m {:02}s", secs / 60, secs % 60)
        }
    }
}

// ============================================================================
// Progress Bars
// ============================================================================

/// Progress bars on consecutive terminal lines, one per named phase.
///
/// Counters are atomic; redraws are serialized by a mutex so any thread may
/// call [`inc_by_name`](Self::inc_by_name).
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    /// Row within the progress area, 0 is the top bar.
    row: usize,
}

impl ProgressBars {
    /// Reserve one line per `(name, total)` entry.
    pub fn new(modules: &[(&'static str, usize)]) -> Self {
        let mut stdout = stdout().lock();
        for _ in 0..modules.len() {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();

        BAR_COUNT.store(modules.len(), Ordering::SeqCst);

        let bars = modules
            .iter()
            .enumerate()
            .map(|(row, &(name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name),
                prefix_len: calc_prefix_len(name.len()),
                total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
        }
    }

    /// Like [`new`](Self::new) without empty entries. `None` when at most one
    /// item is tracked in total.
    pub fn new_filtered(modules: &[(&'static str, usize)]) -> Option<Self> {
        let filtered: Vec<_> = modules
            .iter()
            .filter(|(_, count)| *count > 0)
            .copied()
            .collect();
        let total: usize = filtered.iter().map(|(_, c)| c).sum();

        (total > 1).then(|| Self::new(&filtered))
    }

    /// Advance the bar called `name`.
    pub fn inc_by_name(&self, name: &str) {
        if let Some(bar) = self.bars.iter().find(|bar| bar.name == name) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.display(bar, current);
        }
    }

    fn display(&self, bar: &ProgressBar, current: usize) {
        let _guard = self.lock.lock().ok();

        let width = get_terminal_width() as usize;
        let progress_text = format!("{}/{}", current, bar.total);
        let overhead = bar.prefix_len + BAR_WRAPPER_LEN + SPACE_BEFORE_COUNT + progress_text.len();
        let bar_width = width
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);

        let filled = (current * bar_width).checked_div(bar.total).unwrap_or(0).min(bar_width);
        let progress_bar = "█".repeat(filled) + &"░".repeat(bar_width - filled);

        let mut stdout = stdout().lock();
        #[allow(clippy::cast_possible_truncation)]
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{}] {}", bar.prefix, progress_bar, progress_text).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Clear the bars and release their rows.
    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&self) {
        if BAR_COUNT.swap(0, Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        let rows = self.bars.len() as u16;

        execute!(stdout, cursor::MoveUp(rows)).ok();
        for _ in &self.bars {
            execute!(stdout, Clear(ClearType::CurrentLine)).ok();
            execute!(stdout, cursor::MoveDown(1)).ok();
        }
        execute!(stdout, cursor::MoveUp(rows)).ok();
        stdout.flush().ok();
    }

    #[cfg(test)]
    fn current(&self, name: &str) -> Option<usize> {
        self.bars
            .iter()
            .find(|bar| bar.name == name)
            .map(|bar| bar.current.load(Ordering::Relaxed))
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}
