// ai
//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The VPN was down. Jama was unreachable. But someone, last Tuesday, had exported
//! both filters to disk "just in case". Those files are the heroes of this module.
//!
//! - [`FileSource`]: reads a filter dump per filter id. The dump can be a JSON array,
//!   a raw Jama page (`{"data": [...]}`), or NDJSON. We sniff, we don't ask.
//! - [`FileDirectory`]: a JSON object of `{ "<user id>": { profile } }`. Users not in
//!   the file fail their lookup, which is recoverable, which is fine.
//! - [`FileSink`]: writes each report table to `<output_dir>/<stem>.<ext>` with a
//!   BufWriter so we're not doing a syscall per row like some kind of 1995 CGI script.
//!
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

mod file_sink;
mod file_source;

pub use file_sink::{FileSink, FileSinkConfig};
pub use file_source::{FileDirectory, FileSource, FileSourceConfig, FilterDump};
