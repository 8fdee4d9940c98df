//! Report model and renderers
//!
//! A [`Report`] is an ordered list of classified [`ReportLine`]s plus the
//! global verdict. Rendering is pure: [`Report::render_html`] produces the
//! rich markup and [`Report::render_plain`] its tag-stripped form.

use crate::record::TestRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

const LINE_BREAK: &str = "<br />";

/// Labels used when rendering a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLabels {
    /// Label for a working record
    pub work: String,
    /// Label for a failed record
    pub fail: String,
    /// Global label when every counted record works
    pub global_work: String,
    /// Global label when a counted record failed
    pub global_fail: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            work: "OK".to_string(),
            fail: "KO".to_string(),
            global_work: "[GLOBAL : OKSFR]".to_string(),
            global_fail: "[GLOBAL : KOSFR]".to_string(),
        }
    }
}

/// Outcome of a checked record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Wrapped work succeeded
    Working,
    /// Wrapped work failed, or never ran
    Error,
}

impl Outcome {
    fn css_class(self) -> &'static str {
        match self {
            Outcome::Working => "working",
            Outcome::Error => "error",
        }
    }
}

/// One classified line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportLine {
    /// Monitored record
    Checked {
        /// Record identifier
        identifier: String,
        /// Working or error
        outcome: Outcome,
        /// Subject is administratively disabled
        disabled: bool,
        /// Call duration in seconds
        duration: Option<f64>,
        /// Captured error message
        message: Option<String>,
    },
    /// Record whose subject is not monitored
    NotMonitored {
        /// Record identifier
        identifier: String,
    },
}

impl ReportLine {
    /// Classify a record.
    ///
    /// Records without a configuration (diagnostic tests) are treated as
    /// monitored and enabled.
    pub fn classify(record: &TestRecord) -> Self {
        let configuration = record.subject().configuration();
        let monitored = configuration.map_or(true, |c| c.is_monitored());
        let enabled = configuration.map_or(true, |c| c.is_enabled());

        if !monitored {
            return ReportLine::NotMonitored {
                identifier: record.identifier().to_string(),
            };
        }

        let outcome = if record.is_working() {
            Outcome::Working
        } else {
            Outcome::Error
        };

        ReportLine::Checked {
            identifier: record.identifier().to_string(),
            outcome,
            disabled: !enabled,
            duration: record.duration(),
            message: record.exception().map(|e| e.to_string()),
        }
    }

    /// Whether this line turns the global verdict to failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ReportLine::Checked {
                outcome: Outcome::Error,
                disabled: false,
                ..
            }
        )
    }

    /// Record identifier
    pub fn identifier(&self) -> &str {
        match self {
            ReportLine::Checked { identifier, .. } | ReportLine::NotMonitored { identifier } => {
                identifier
            }
        }
    }

    /// Render the line as HTML
    pub fn render_html(&self, labels: &ReportLabels) -> String {
        match self {
            ReportLine::NotMonitored { identifier } => format!(
                "<span class=\"libelle nomon\">{identifier} (non supervis&eacute;)</span>\
                 {LINE_BREAK}{LINE_BREAK}"
            ),
            ReportLine::Checked {
                identifier,
                outcome,
                disabled,
                duration,
                message,
            } => {
                let mut class = outcome.css_class().to_string();
                let mut label = identifier.clone();
                if *disabled {
                    class.push_str(" disabled");
                    label.push_str(" (d&eacute;sactiv&eacute;)");
                }
                let duration = duration.unwrap_or_default();

                let mut line =
                    format!("<span class=\"libelle {class}\">{label}</span>{LINE_BREAK}");
                match outcome {
                    Outcome::Working => {
                        line += &format!(
                            "<span class=\"{class}\">{} ({duration:.4}sec) </span>",
                            labels.work
                        );
                    }
                    Outcome::Error => {
                        line += &format!(
                            "<span class=\"{class}\">{} ({duration:.4}sec)",
                            labels.fail
                        );
                        if let Some(message) = message.as_deref().filter(|m| !m.is_empty()) {
                            line += &format!(" - {message}");
                        }
                        line.push_str("</span>");
                    }
                }
                line.push_str(LINE_BREAK);
                line
            }
        }
    }
}

/// Aggregate report over a sequence of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    lines: Vec<ReportLine>,
    healthy: bool,
    labels: ReportLabels,
}

impl Report {
    /// Classify every record, in order
    pub fn from_records<'a, I>(records: I, labels: ReportLabels) -> Self
    where
        I: IntoIterator<Item = &'a TestRecord>,
    {
        let lines: Vec<ReportLine> = records.into_iter().map(ReportLine::classify).collect();
        let healthy = !lines.iter().any(ReportLine::is_failure);
        Self {
            lines,
            healthy,
            labels,
        }
    }

    /// Classified lines
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Global verdict
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Labels used for rendering
    pub fn labels(&self) -> &ReportLabels {
        &self.labels
    }

    /// The global status label
    pub fn global_label(&self) -> &str {
        if self.healthy {
            &self.labels.global_work
        } else {
            &self.labels.global_fail
        }
    }

    /// Rich rendering
    pub fn render_html(&self) -> String {
        let mut html: String = self
            .lines
            .iter()
            .map(|line| line.render_html(&self.labels))
            .collect();
        html.push_str(LINE_BREAK);
        html.push_str(self.global_label());
        html
    }

    /// Plain-text rendering
    pub fn render_plain(&self) -> String {
        to_plain_text(&self.render_html())
    }
}

/// Convert report markup to plain text.
///
/// Line breaks become `\r\n` and every other tag is removed. The accent
/// entity the renderer emits is decoded first; any other entity is left as is
/// so escaped markup never turns back into tags.
pub fn to_plain_text(html: &str) -> String {
    let text = html.replace(LINE_BREAK, "\r\n").replace("&eacute;", "é");
    TAG.replace_all(&text, "").into_owned()
}
