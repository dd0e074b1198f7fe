// AI
//! 📊 progress.rs: "Are we there yet?" Every directory build, every time, forever.
//!
//! 🚀 User lookups are one network round trip each. With a few hundred people in a
//! project that's a few hundred round trips, and a silent terminal in the meantime
//! feels like a hang. So: a progress bar, a running resolved/failed tally, an ETA.
//!
//! ⚠️  Warning: Watching this progress bar will not make Jama answer faster.
//! Neither will refreshing it. We've tried. Science says no.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📇 Progress for the user-directory lookup loop.
///
/// Hidden entirely when there is nothing to look up, so a fully cached directory
/// doesn't flash an empty bar at you.
pub(crate) struct LookupProgress {
    progress_bar: ProgressBar,
}

impl std::fmt::Debug for LookupProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("LookupProgress")
            .field("position", &self.progress_bar.position())
            .field("length", &self.progress_bar.length())
            .finish()
    }
}

impl LookupProgress {
    pub(crate) fn new(total_lookups: u64) -> Self {
        let progress_bar = if total_lookups == 0 {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_lookups)
        };
        // -- 🎨 cyan because it's classy, blue because it's calm. Falls back to the
        // -- default style if the template ever stops parsing, rather than panicking mid-run.
        if let Ok(style) = ProgressStyle::default_bar()
            .template("👥 users [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Self { progress_bar }
    }

    /// 🔄 One more lookup done, successful or not.
    pub(crate) fn tick(&self, resolved: usize, failed: usize) {
        self.progress_bar.inc(1);
        self.progress_bar
            .set_message(format!("✅ {} resolved · 💀 {} failed", resolved, failed));
    }

    /// ✅ Ring the bell. We made it. Leaves the elapsed time behind as a souvenir.
    pub(crate) fn finish(&self) {
        let elapsed = format_duration(self.progress_bar.elapsed());
        self.progress_bar
            .finish_with_message(format!("done in {}", elapsed));
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.progress_bar.position()
    }
}
