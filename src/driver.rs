//! Translation driver.
//!
//! Walks a range of records one at a time: translate, rewrite the output
//! file, append to the run log, then wait before the next request. A
//! failed translation keeps the original text and the run moves on.

use crate::console::Console;
use crate::error::Result;
use crate::records::{self, Record};
use crate::translator::{ProgressInfo, TranslationRequest, TranslationService};
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// First line of every run log.
pub const LOG_HEADER: &str = "--- Translation Log ---";

/// Inclusive, 1-based record range.
///
/// Resolution never fails: out-of-range values shrink the range, possibly
/// to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First record to process (1-based).
    pub start: usize,
    /// Last record to process, or `None` for the end of the collection.
    pub end: Option<usize>,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
        }
    }
}

impl RangeSpec {
    /// Resolves to a zero-based index range over `len` records.
    pub fn resolve(&self, len: usize) -> Range<usize> {
        if self.start == 0 {
            return 0..0;
        }

        let begin = self.start - 1;
        let end = self.end.unwrap_or(len).min(len);

        if begin >= end { 0..0 } else { begin..end }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// The translated text.
    Translated(String),
    /// Why the translation failed.
    Failed(String),
}

/// Plain-text log with one line per processed record.
pub struct RunLog<W: Write> {
    writer: W,
}

impl RunLog<BufWriter<File>> {
    /// Creates (or truncates) the log file and writes the header.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> RunLog<W> {
    /// Wraps a writer and writes the header.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", LOG_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Appends the outcome for record `index` and flushes.
    pub fn record(&mut self, index: usize, outcome: &SegmentOutcome) -> io::Result<()> {
        match outcome {
            SegmentOutcome::Translated(_) => writeln!(self.writer, "Segment {}: Success", index)?,
            SegmentOutcome::Failed(reason) => writeln!(
                self.writer,
                "Segment {}: Failed - {}",
                index,
                reason.replace(['\r', '\n'], " ")
            )?,
        }
        self.writer.flush()
    }
}

/// Settings for one driver run.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Records to process.
    pub range: RangeSpec,
    /// Output segment file, rewritten after every record.
    pub output: PathBuf,
    /// Run log path.
    pub log_file: PathBuf,
    /// Pause after each record.
    pub delay: Duration,
    /// System-level guidance sent with every record.
    pub system_instruction: String,
    /// Assistant-level guidance sent with every record.
    pub assistant_instruction: String,
}

/// Counts from a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Translates one record's content. Never fails; errors become outcomes.
pub async fn translate_record(
    service: &dyn TranslationService,
    record: &Record,
    options: &DriverOptions,
    progress: Option<ProgressInfo>,
) -> SegmentOutcome {
    let request = TranslationRequest {
        text: &record.content,
        system_instruction: &options.system_instruction,
        assistant_instruction: &options.assistant_instruction,
        progress,
    };

    match service.translate(&request).await {
        Ok(text) if !text.trim().is_empty() => SegmentOutcome::Translated(text),
        Ok(_) => SegmentOutcome::Failed("Empty translation".to_string()),
        Err(e) => SegmentOutcome::Failed(e.to_string()),
    }
}

/// Processes the configured range of `records`.
///
/// The output file holds the records processed so far, in order, each
/// either translated or untouched. It is rewritten in full after every
/// record, so stopping the process at any point leaves a file that is
/// consistent up to the last completed record.
pub async fn run(
    service: &dyn TranslationService,
    records: &[Record],
    options: &DriverOptions,
    console: &Console,
) -> Result<DriverSummary> {
    let range = options.range.resolve(records.len());
    let last = range.end;
    let mut log = RunLog::create(&options.log_file)
        .with_context(|| format!("Failed to create log file {}", options.log_file.display()))?;

    let mut summary = DriverSummary::default();
    let mut processed: Vec<Record> = Vec::with_capacity(range.len());

    for (offset, record) in records[range.clone()].iter().enumerate() {
        let index = range.start + offset + 1;
        console.step(&format!("Translating segment {} ({})...", index, record.id));

        let progress = ProgressInfo { index, last };
        let outcome = translate_record(service, record, options, Some(progress)).await;

        let mut record = record.clone();
        match &outcome {
            SegmentOutcome::Translated(text) => {
                console.success(&format!("Segment {} translated", index));
                record.content = text.clone();
                summary.succeeded += 1;
            }
            SegmentOutcome::Failed(reason) => {
                console.error(&format!("Segment {} failed: {}", index, reason));
                summary.failed += 1;
            }
        }
        summary.processed += 1;

        log.record(index, &outcome)
            .with_context(|| format!("Failed to write log file {}", options.log_file.display()))?;

        processed.push(record);
        records::save(&options.output, &processed).context("Failed to save output")?;

        if !options.delay.is_zero() {
            console.info(&format!(
                "Waiting {}s before the next request",
                options.delay.as_secs_f64()
            ));
            tokio::time::sleep(options.delay).await;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Prefixes the text, or fails for contents listed in `fail_on`.
    struct FakeTranslator {
        fail_on: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTranslator {
        fn new() -> Self {
            Self {
                fail_on: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(contents: &[&str]) -> Self {
            Self {
                fail_on: contents.iter().map(|c| c.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranslationService for FakeTranslator {
        async fn translate(
            &self,
            request: &TranslationRequest<'_>,
        ) -> std::result::Result<String, TranslationError> {
            self.calls.lock().unwrap().push(request.text.to_string());
            if self.fail_on.iter().any(|c| c == request.text) {
                return Err(TranslationError::ApiError("HTTP 429: quota".to_string()));
            }
            Ok(format!("VI:{}", request.text))
        }
    }

    /// Always fails.
    struct BrokenTranslator;

    #[async_trait]
    impl TranslationService for BrokenTranslator {
        async fn translate(
            &self,
            _request: &TranslationRequest<'_>,
        ) -> std::result::Result<String, TranslationError> {
            Err(TranslationError::ApiError("connection refused".to_string()))
        }
    }

    /// Returns whitespace only.
    struct BlankTranslator;

    #[async_trait]
    impl TranslationService for BlankTranslator {
        async fn translate(
            &self,
            _request: &TranslationRequest<'_>,
        ) -> std::result::Result<String, TranslationError> {
            Ok("  \n".to_string())
        }
    }

    /// Records how many records the output file held at each call.
    struct SnapshotTranslator {
        output: PathBuf,
        seen: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl TranslationService for SnapshotTranslator {
        async fn translate(
            &self,
            request: &TranslationRequest<'_>,
        ) -> std::result::Result<String, TranslationError> {
            let count = if self.output.exists() {
                records::load(&self.output).unwrap().len()
            } else {
                0
            };
            self.seen.lock().unwrap().push(count);
            Ok(request.text.to_uppercase())
        }
    }

    fn sample_records(n: usize) -> Vec<Record> {
        (1..=n)
            .map(|i| Record {
                id: format!("Chapter_1_Segment_{}", i),
                title: "第一章".to_string(),
                content: format!("内容{}\n第二行{}", i, i),
            })
            .collect()
    }

    fn options(dir: &TempDir, range: RangeSpec) -> DriverOptions {
        DriverOptions {
            range,
            output: dir.path().join("output.yaml"),
            log_file: dir.path().join("translation_log.txt"),
            delay: Duration::ZERO,
            system_instruction: "system".to_string(),
            assistant_instruction: "assistant".to_string(),
        }
    }

    fn log_lines(options: &DriverOptions) -> Vec<String> {
        std::fs::read_to_string(&options.log_file)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_range_to_end() {
        let range = RangeSpec {
            start: 3,
            end: None,
        };
        assert_eq!(range.resolve(5), 2..5);
    }

    #[test]
    fn test_range_inclusive_end() {
        let range = RangeSpec {
            start: 2,
            end: Some(4),
        };
        assert_eq!(range.resolve(5), 1..4);
    }

    #[test]
    fn test_range_end_truncated() {
        let range = RangeSpec {
            start: 4,
            end: Some(50),
        };
        assert_eq!(range.resolve(5), 3..5);
    }

    #[test]
    fn test_range_empty_cases() {
        let cases = [
            RangeSpec { start: 0, end: None },
            RangeSpec { start: 6, end: None },
            RangeSpec { start: 4, end: Some(2) },
        ];
        for range in cases {
            assert!(range.resolve(5).is_empty(), "{:?}", range);
        }
        assert!(RangeSpec::default().resolve(0).is_empty());
    }

    #[test]
    fn test_run_log_format() {
        let mut buffer = Vec::new();
        {
            let mut log = RunLog::new(&mut buffer).unwrap();
            log.record(1, &SegmentOutcome::Translated("x".to_string()))
                .unwrap();
            log.record(2, &SegmentOutcome::Failed("HTTP 500:\nboom".to_string()))
                .unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "--- Translation Log ---\nSegment 1: Success\nSegment 2: Failed - HTTP 500: boom\n"
        );
    }

    #[tokio::test]
    async fn test_processes_range_to_end() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(5);
        let options = options(&dir, RangeSpec { start: 3, end: None });
        let service = FakeTranslator::new();

        let summary = run(&service, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(
            service.calls(),
            vec![
                records[2].content.clone(),
                records[3].content.clone(),
                records[4].content.clone()
            ]
        );

        let output = records::load(&options.output).unwrap();
        let ids: Vec<&str> = output.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["Chapter_1_Segment_3", "Chapter_1_Segment_4", "Chapter_1_Segment_5"]
        );
        assert_eq!(output[0].content, "VI:内容3\n第二行3");
        assert_eq!(output[0].title, "第一章");

        assert_eq!(
            log_lines(&options),
            vec![
                LOG_HEADER,
                "Segment 3: Success",
                "Segment 4: Success",
                "Segment 5: Success"
            ]
        );
    }

    #[tokio::test]
    async fn test_always_failing_service_leaves_content_unchanged() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(4);
        let options = options(&dir, RangeSpec::default());

        let summary = run(&BrokenTranslator, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed, 4);
        assert_eq!(records::load(&options.output).unwrap(), records);

        let lines = log_lines(&options);
        assert_eq!(lines.len(), 5);
        for (i, line) in lines[1..].iter().enumerate() {
            assert_eq!(
                line,
                &format!("Segment {}: Failed - API error: connection refused", i + 1)
            );
        }
    }

    #[tokio::test]
    async fn test_mixed_outcomes() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(3);
        let options = options(&dir, RangeSpec::default());
        let service = FakeTranslator::failing_on(&[records[1].content.as_str()]);

        let summary = run(&service, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);

        let output = records::load(&options.output).unwrap();
        assert_eq!(output[0].content, format!("VI:{}", records[0].content));
        assert_eq!(output[1].content, records[1].content);
        assert_eq!(output[2].content, format!("VI:{}", records[2].content));
        assert_eq!(log_lines(&options)[2], "Segment 2: Failed - API error: HTTP 429: quota");
    }

    #[tokio::test]
    async fn test_blank_translation_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(1);
        let options = options(&dir, RangeSpec::default());

        let summary = run(&BlankTranslator, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(records::load(&options.output).unwrap(), records);
        assert_eq!(log_lines(&options)[1], "Segment 1: Failed - Empty translation");
    }

    #[tokio::test]
    async fn test_output_rewritten_after_each_record() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(4);
        let options = options(&dir, RangeSpec::default());
        let service = SnapshotTranslator {
            output: options.output.clone(),
            seen: Mutex::new(Vec::new()),
        };

        run(&service, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(*service.seen.lock().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(records::load(&options.output).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_range_processes_nothing() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(2);
        let options = options(&dir, RangeSpec { start: 7, end: None });
        let service = FakeTranslator::new();

        let summary = run(&service, &records, &options, &Console::with_colors(false))
            .await
            .unwrap();

        assert_eq!(summary, DriverSummary::default());
        assert!(service.calls().is_empty());
        assert!(!options.output.exists());
        assert_eq!(log_lines(&options), vec![LOG_HEADER]);
    }
}
