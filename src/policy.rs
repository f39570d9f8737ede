use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, warn};
use log4rs::append::rolling_file::policy::Policy;
use log4rs::append::rolling_file::LogFile;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{Error, Result};
use crate::file_size::FileSize;
use crate::properties::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_HISTORY, DEFAULT_TOTAL_SIZE_CAP};

/// Rolling policy that archives the active file on a size cap or a
/// time-unit boundary, whichever triggers first.
///
/// Historical segments are named by a date-and-index pattern such as
/// `log/app-{date:yyyy-MM-dd-HH}-{index}.log`. The date stamp is the
/// period the segment's content belongs to; the index separates the
/// size-triggered splits inside one period. Old segments are pruned by
/// a retention count and a total-size cap, and a cleanup pass runs
/// immediately at construction so pre-existing files are brought under
/// both caps before the first rollover.
///
/// # Examples
///
/// ```no_run
/// use logspace::SizeAndTimePolicy;
///
/// let policy = SizeAndTimePolicy::builder()
///     .max_history(7)
///     .build("log/app-{date:yyyy-MM-dd}-{index}.log")
///     .unwrap();
/// assert_eq!(policy.max_history(), 7);
/// ```
#[derive(Debug)]
pub struct SizeAndTimePolicy {
    pattern: SegmentPattern,
    max_file_size: FileSize,
    total_size_cap: FileSize,
    max_history: u32,
    state: Mutex<RollState>,
}

/// Mutable rollover bookkeeping: the period the active file belongs to
/// and the next segment index inside that period.
#[derive(Debug)]
struct RollState {
    stamp: String,
    index: u32,
}

/// Builder for [`SizeAndTimePolicy`]; unset knobs keep the documented
/// defaults (250MB segment cap, 15GB total cap, 168 units of history,
/// cleanup on start).
#[derive(Debug, Clone)]
pub struct SizeAndTimePolicyBuilder {
    max_file_size: FileSize,
    total_size_cap: FileSize,
    max_history: u32,
    clean_history_on_start: bool,
}

impl Default for SizeAndTimePolicyBuilder {
    fn default() -> Self {
        SizeAndTimePolicyBuilder {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            total_size_cap: DEFAULT_TOTAL_SIZE_CAP,
            max_history: DEFAULT_MAX_HISTORY,
            clean_history_on_start: true,
        }
    }
}

impl SizeAndTimePolicyBuilder {
    pub fn max_file_size(mut self, size: FileSize) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn total_size_cap(mut self, cap: FileSize) -> Self {
        self.total_size_cap = cap;
        self
    }

    pub fn max_history(mut self, max_history: u32) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn clean_history_on_start(mut self, clean: bool) -> Self {
        self.clean_history_on_start = clean;
        self
    }

    /// Parses the file-name pattern and finishes the policy.
    ///
    /// The pattern must contain one `{date:...}` token followed by one
    /// `{index}` token. The starting index continues after the highest
    /// segment index already on disk for the current period, so a
    /// restart never overwrites existing segments.
    pub fn build(self, file_name_pattern: &str) -> Result<SizeAndTimePolicy> {
        let pattern = SegmentPattern::parse(file_name_pattern)?;
        let stamp = pattern.current_stamp();
        let index = next_index(&pattern, &stamp);

        let policy = SizeAndTimePolicy {
            pattern,
            max_file_size: self.max_file_size,
            total_size_cap: self.total_size_cap,
            max_history: self.max_history,
            state: Mutex::new(RollState { stamp, index }),
        };

        if self.clean_history_on_start {
            if let Err(err) = policy.prune() {
                warn!("startup cleanup of old log segments failed: {err}");
            }
        }

        Ok(policy)
    }
}

impl SizeAndTimePolicy {
    pub fn builder() -> SizeAndTimePolicyBuilder {
        SizeAndTimePolicyBuilder::default()
    }

    pub fn max_file_size(&self) -> FileSize {
        self.max_file_size
    }

    pub fn total_size_cap(&self) -> FileSize {
        self.total_size_cap
    }

    pub fn max_history(&self) -> u32 {
        self.max_history
    }

    pub fn pattern(&self) -> &SegmentPattern {
        &self.pattern
    }

    /// Archives `path` into a historical segment if the size cap or the
    /// period boundary says so. Returns whether a roll happened; the
    /// caller is responsible for reopening the active file.
    ///
    /// `len` is the current size of the active file in bytes.
    pub fn consider_roll(&self, path: &Path, len: u64) -> io::Result<bool> {
        let now_stamp = self.pattern.current_stamp();
        let mut state = self.state.lock();

        let period_rolled = now_stamp != state.stamp;
        if !period_rolled && len < self.max_file_size.bytes() {
            return Ok(false);
        }

        if !path.exists() {
            // Nothing to archive yet, just move the bookkeeping forward.
            if period_rolled {
                state.stamp = now_stamp;
                state.index = 0;
            }
            return Ok(false);
        }

        // Content written so far belongs to the period recorded in the
        // state, not to the period that is beginning now.
        let mut segment = self.pattern.segment_path(&state.stamp, state.index);
        while segment.exists() {
            state.index += 1;
            segment = self.pattern.segment_path(&state.stamp, state.index);
        }

        if let Some(parent) = segment.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::rename(path, &segment)?;
        debug!("rolled {} into {}", path.display(), segment.display());

        if period_rolled {
            state.stamp = now_stamp;
            state.index = 0;
        } else {
            state.index += 1;
        }
        drop(state);

        if let Err(err) = self.prune() {
            warn!("pruning old log segments failed: {err}");
        }

        Ok(true)
    }

    /// Deletes the oldest historical segments until the retention count
    /// and the total-size cap are both satisfied.
    fn prune(&self) -> io::Result<()> {
        let mut segments = self.pattern.existing_segments()?;
        segments.sort_by(|a, b| a.stamp.cmp(&b.stamp).then_with(|| a.index.cmp(&b.index)));

        let mut total: u64 = segments.iter().map(|s| s.len).sum();
        let mut doomed = 0usize;

        while segments.len() - doomed > self.max_history as usize {
            total -= segments[doomed].len;
            doomed += 1;
        }
        while total > self.total_size_cap.bytes() && doomed < segments.len() {
            total -= segments[doomed].len;
            doomed += 1;
        }

        for segment in &segments[..doomed] {
            fs::remove_file(&segment.path)?;
            debug!("removed expired log segment {}", segment.path.display());
        }

        Ok(())
    }
}

impl Policy for SizeAndTimePolicy {
    fn process(&self, log_file: &mut LogFile) -> anyhow::Result<()> {
        let path = log_file.path().to_path_buf();
        let len = log_file.len_estimate();
        if self.consider_roll(&path, len)? {
            log_file.roll();
        }
        Ok(())
    }

    fn is_pre_process(&self) -> bool {
        // Check before the event is written so a period boundary puts
        // the event into the new period's file.
        true
    }
}

/// A historical segment found on disk.
#[derive(Debug)]
pub struct Segment {
    pub path: PathBuf,
    pub len: u64,
    pub stamp: String,
    pub index: u32,
}

/// Parsed form of a rolling file-name pattern.
///
/// A pattern is a path whose file name contains a `{date:...}` token
/// with a Java-style date format (`yyyy`, `MM`, `dd`, `HH`, `mm`) and an
/// `{index}` token, for example `log/app-{date:yyyy-MM-dd-HH}-{index}.log`.
/// The finest date token present defines the rollover period: a pattern
/// with an hour token rolls hourly, a date-only pattern rolls daily.
#[derive(Debug, Clone)]
pub struct SegmentPattern {
    dir: PathBuf,
    prefix: String,
    date_format: String,
    infix: String,
    suffix: String,
    matcher: Regex,
}

impl SegmentPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let path = Path::new(pattern);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| pattern_error(pattern, "missing file name"))?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let date_start = file_name
            .find("{date:")
            .ok_or_else(|| pattern_error(pattern, "missing {date:...} token"))?;
        if file_name[..date_start].contains("{index}") {
            return Err(pattern_error(pattern, "{index} must follow {date:...}"));
        }
        let body = &file_name[date_start + 6..];
        let date_end = body
            .find('}')
            .ok_or_else(|| pattern_error(pattern, "unterminated {date:...} token"))?;
        let date_spec = &body[..date_end];
        let after_date = &body[date_end + 1..];
        let index_start = after_date
            .find("{index}")
            .ok_or_else(|| pattern_error(pattern, "missing {index} token"))?;

        let prefix = file_name[..date_start].to_string();
        let infix = after_date[..index_start].to_string();
        let suffix = after_date[index_start + "{index}".len()..].to_string();

        let (date_format, date_regex) =
            translate_date_format(date_spec).map_err(|reason| pattern_error(pattern, &reason))?;

        let expr = format!(
            "^{}({}){}(\\d+){}$",
            regex::escape(&prefix),
            date_regex,
            regex::escape(&infix),
            regex::escape(&suffix),
        );
        let matcher = Regex::new(&expr).map_err(|err| pattern_error(pattern, &err.to_string()))?;

        Ok(SegmentPattern {
            dir,
            prefix,
            date_format,
            infix,
            suffix,
            matcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Formats the current local time with the pattern's date format.
    /// Two calls return different stamps exactly when the rollover
    /// period has changed between them.
    pub fn current_stamp(&self) -> String {
        Local::now().format(&self.date_format).to_string()
    }

    /// Full path of the segment for a period stamp and an index.
    pub fn segment_path(&self, stamp: &str, index: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}{}{}",
            self.prefix, stamp, self.infix, index, self.suffix
        ))
    }

    /// Scans the pattern's directory for files named by this pattern.
    pub fn existing_segments(&self) -> io::Result<Vec<Segment>> {
        let dir: &Path = if self.dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.dir
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut segments = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(name) => name,
                None => continue,
            };
            let captures = match self.matcher.captures(name) {
                Some(captures) => captures,
                None => continue,
            };
            let index = match captures[2].parse::<u32>() {
                Ok(index) => index,
                Err(_) => continue,
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            segments.push(Segment {
                path: entry.path(),
                len: metadata.len(),
                stamp: captures[1].to_string(),
                index,
            });
        }

        Ok(segments)
    }
}

/// Highest segment index on disk for `stamp`, plus one.
fn next_index(pattern: &SegmentPattern, stamp: &str) -> u32 {
    match pattern.existing_segments() {
        Ok(segments) => segments
            .iter()
            .filter(|s| s.stamp == stamp)
            .map(|s| s.index + 1)
            .max()
            .unwrap_or(0),
        Err(_) => 0,
    }
}

/// Translates a Java-style date format into a chrono format string and
/// a regex matching its rendered form.
fn translate_date_format(spec: &str) -> std::result::Result<(String, String), String> {
    let mut chrono_format = String::new();
    let mut shape = String::new();
    let mut tokens = 0usize;
    let mut rest = spec;

    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix("yyyy") {
            chrono_format.push_str("%Y");
            shape.push_str("\\d{4}");
            tokens += 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("MM") {
            chrono_format.push_str("%m");
            shape.push_str("\\d{2}");
            tokens += 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("dd") {
            chrono_format.push_str("%d");
            shape.push_str("\\d{2}");
            tokens += 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("HH") {
            chrono_format.push_str("%H");
            shape.push_str("\\d{2}");
            tokens += 1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("mm") {
            chrono_format.push_str("%M");
            shape.push_str("\\d{2}");
            tokens += 1;
            rest = r;
        } else {
            let c = match rest.chars().next() {
                Some(c) => c,
                None => break,
            };
            if c.is_ascii_alphanumeric() {
                return Err(format!("unsupported date token in {spec:?}"));
            }
            if c == '%' {
                chrono_format.push_str("%%");
            } else {
                chrono_format.push(c);
            }
            shape.push_str(&regex::escape(&c.to_string()));
            rest = &rest[c.len_utf8()..];
        }
    }

    if tokens == 0 {
        return Err(format!("no date tokens in {spec:?}"));
    }

    Ok((chrono_format, shape))
}

fn pattern_error(pattern: &str, reason: &str) -> Error {
    Error::Pattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}
