//! Textual progress bar rendered in place with carriage returns.

use std::collections::VecDeque;
use std::io::Write;
use std::time::{Duration, Instant};

/// How many recent tick intervals feed the it/s estimate.
const RATE_WINDOW: usize = 5;

/// Progress bar with optional numeric display, timing, and a sub-division
/// row for large maxima.
pub struct ProgressBar {
    maximum: usize,
    message: String,
    end_message: Option<String>,
    show_numbers: bool,
    timed: bool,
    end_time: bool,
    extended: bool,
    segments: usize,
    symbol: char,
    extended_symbol: char,
    extend_segments: usize,

    current: usize,
    status_message: String,
    /// Extra trailing spaces on the next redraw, to blank out a status
    /// message that just got shorter.
    next_clean: usize,
    ended: bool,
    start: Instant,
    last_tick: Option<Instant>,
    recent: VecDeque<Duration>,
}

impl ProgressBar {
    /// Bar counting up to `maximum` with a leading task message.
    ///
    /// The sub-division row switches on automatically when a single segment
    /// covers ten or more units; override with [`ProgressBar::extended`].
    pub fn new(maximum: usize, message: impl Into<String>) -> Self {
        let segments = 20;
        Self {
            maximum,
            message: message.into(),
            end_message: None,
            show_numbers: true,
            timed: false,
            end_time: true,
            extended: maximum >= segments * 10,
            segments,
            symbol: '=',
            extended_symbol: '-',
            extend_segments: 10,
            current: 0,
            status_message: String::new(),
            next_clean: 0,
            ended: false,
            start: Instant::now(),
            last_tick: None,
            recent: VecDeque::with_capacity(RATE_WINDOW),
        }
    }

    /// Replace the bar with this message when it completes.
    pub fn with_end_message(mut self, message: impl Into<String>) -> Self {
        self.end_message = Some(message.into());
        self
    }

    /// Show elapsed time and an it/s estimate while running.
    pub fn timed(mut self) -> Self {
        self.timed = true;
        self
    }

    /// Hide the `current/maximum` numbers.
    pub fn without_numbers(mut self) -> Self {
        self.show_numbers = false;
        self
    }

    /// Do not append the total time to the end message.
    pub fn without_end_time(mut self) -> Self {
        self.end_time = false;
        self
    }

    /// Number of segments in the bar.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(1);
        self
    }

    /// Force the sub-division row on or off.
    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Advance the bar by one and redraw.
    pub fn tick(&mut self) {
        self.tick_by(1);
    }

    /// Advance the bar by `step` and redraw.
    pub fn tick_by(&mut self, step: usize) {
        self.current += step;

        if self.timed {
            let now = Instant::now();
            if let Some(last) = self.last_tick {
                self.recent.push_back(now - last);
                if self.recent.len() > RATE_WINDOW {
                    self.recent.pop_front();
                }
            }
            self.last_tick = Some(now);
        }

        self.redraw();
    }

    /// Redraw without advancing; refreshes the elapsed time display.
    pub fn update(&mut self) {
        self.redraw();
    }

    /// Print a message above the bar, keeping the bar intact below it.
    pub fn print(&mut self, message: &str) {
        self.clean();
        println!("{}", message);
        self.redraw();
    }

    /// Show a status message beside the bar. Only one is visible at a time.
    pub fn status(&mut self, message: impl Into<String>) {
        self.next_clean = self.status_message.len() + 3;
        self.status_message = message.into();
    }

    /// Remove the current status message.
    pub fn clear_status(&mut self) {
        self.status(String::new());
    }

    /// Force the bar to complete.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        let Some(end_message) = self.end_message.clone() else {
            println!();
            return;
        };
        self.clean();
        if self.end_time {
            println!(
                "{}  [in {}]",
                end_message,
                format_time(self.start.elapsed())
            );
        } else {
            println!("{}", end_message);
        }
    }

    fn redraw(&mut self) {
        let mut line = self.render_line();
        if self.next_clean > 0 {
            line.push_str(&" ".repeat(self.next_clean));
            self.next_clean = 0;
        }
        print!("{}\r", line);
        let _ = std::io::stdout().flush();

        if self.current >= self.maximum {
            self.end();
        }
    }

    /// The bar line as it would be drawn, without trailing blanking.
    fn render_line(&self) -> String {
        let filled = if self.maximum == 0 {
            self.segments
        } else {
            (self.current * self.segments / self.maximum).min(self.segments)
        };

        let mut line = format!(
            "{} [{}{}]",
            self.message,
            self.symbol.to_string().repeat(filled),
            " ".repeat(self.segments - filled)
        );

        if self.show_numbers {
            line.push_str(&format!(" {}/{}", self.current, self.maximum));
        }

        if self.timed && !self.recent.is_empty() {
            let avg =
                self.recent.iter().sum::<Duration>().as_secs_f64() / self.recent.len() as f64;
            if avg > 0.0 {
                line.push_str(&format!(
                    " ({}|{:.1}it/s)",
                    format_time(self.start.elapsed()),
                    1.0 / avg
                ));
            }
        }

        if self.extended && self.maximum > 0 {
            let per_segment = self.maximum as f64 / self.segments as f64;
            let rest = self.current as f64 - filled as f64 * per_segment;
            let len = ((rest / per_segment) * self.extend_segments as f64) as usize + 1;
            line.push_str(&format!(
                " {}>{}",
                self.extended_symbol.to_string().repeat(len.saturating_sub(1)),
                " ".repeat(self.extend_segments.saturating_sub(len) + 1)
            ));
        }

        if !self.status_message.is_empty() {
            line.push_str(&format!(" - {}", self.status_message));
        }

        line
    }

    /// Blank out the current bar line.
    fn clean(&self) {
        let mut width = self.message.len() + self.segments + 5;
        if self.show_numbers {
            width += 2 + self.maximum.to_string().len() * 2;
        }
        if self.timed {
            width += 25;
        }
        if self.extended {
            width += 4 + self.extend_segments;
        }
        if !self.status_message.is_empty() {
            width += self.status_message.len() + 3;
        }
        print!("{}\r", " ".repeat(width));
        let _ = std::io::stdout().flush();
    }
}

/// `SS.ff`s under a minute, `MM:SS.ff` above.
fn format_time(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    if total < 60.0 {
        format!("{:05.2}s", total)
    } else {
        format!("{:02}:{:05.2}", (total / 60.0) as u64, total % 60.0)
    }
}
