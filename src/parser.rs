/// Exposition-format parser: turns the raw metrics text published by the
/// Sofia AI upstream into a fully-populated `MetricsRecord`.
///
/// The feed is treated as a flat set of scalar samples, one per line:
/// `name{labels} value`. Label blocks are accepted but never interpreted,
/// unknown metric names are skipped, and a repeated name overwrites the
/// earlier value. Lines that do not fit the sample shape are dropped
/// silently — the feed mixes in metric families this parser does not
/// care about.
use crate::model::{
    BusinessMetrics, GeographicalMetrics, LinguisticMetrics, MetricsRecord, PerformanceMetrics,
    QualityMetrics, SystemMetrics,
};
use regex::Regex;
use std::sync::LazyLock;

/// Shape of one sample line: `name[{labels}] value`.
static SAMPLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\{([^}]*)\})?\s+([0-9.-]+)").unwrap());

/// One sample line, borrowed from the input text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample<'a> {
    pub name: &'a str,
    /// Opaque label block contents. Accepted so labelled series parse, but
    /// never interpreted: the value is keyed on the metric name alone.
    #[allow(dead_code)]
    pub labels: Option<&'a str>,
    pub value: f64,
}

/// Lazily yield one `RawSample` per matching line.
///
/// Blank lines, `#` comments, non-matching lines, and lines whose value does
/// not parse as a float are all skipped without error.
fn samples(text: &str) -> impl Iterator<Item = RawSample<'_>> {
    text.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let caps = SAMPLE_LINE.captures(line)?;
        let value: f64 = caps.get(3)?.as_str().parse().ok()?;
        Some(RawSample {
            name: caps.get(1)?.as_str(),
            labels: caps.get(2).map(|m| m.as_str()),
            value,
        })
    })
}

// --- Builders ---
//
// One mutable builder per category, living only inside a single parse call.
// `None` means "never observed in the feed", which is what the required-field
// validation needs to distinguish from an explicit zero.

#[derive(Debug, Default)]
struct BusinessBuilder {
    new_leads: Option<f64>,
    lead_growth: Option<f64>,
    active_conversations: Option<f64>,
    conversation_growth: Option<f64>,
    whatsapp_conversations: Option<f64>,
    voice_conversations: Option<f64>,
    web_conversations: Option<f64>,
    total_revenue: Option<f64>,
    revenue_growth: Option<f64>,
}

#[derive(Debug, Default)]
struct PerformanceBuilder {
    response_time: Option<f64>,
    response_time_change: Option<f64>,
    throughput: Option<f64>,
    throughput_change: Option<f64>,
    error_count: Option<f64>,
    error_change: Option<f64>,
}

#[derive(Debug, Default)]
struct QualityBuilder {
    success_rate: Option<f64>,
    success_rate_change: Option<f64>,
    error_rate: Option<f64>,
    error_rate_change: Option<f64>,
    user_satisfaction: Option<f64>,
    satisfaction_change: Option<f64>,
}

#[derive(Debug, Default)]
struct LinguisticBuilder {
    italian_conversations: Option<f64>,
    english_conversations: Option<f64>,
    french_conversations: Option<f64>,
    spanish_conversations: Option<f64>,
    arabic_conversations: Option<f64>,
    total_languages: Option<f64>,
}

#[derive(Debug, Default)]
struct GeographicalBuilder {
    italy_users: Option<f64>,
    europe_users: Option<f64>,
    usa_users: Option<f64>,
    other_users: Option<f64>,
    total_countries: Option<f64>,
}

#[derive(Debug, Default)]
struct SystemBuilder {
    cpu_usage: Option<f64>,
    memory_usage: Option<f64>,
    disk_usage: Option<f64>,
    uptime: Option<f64>,
    health_status: Option<f64>,
    last_backup: Option<String>,
}

#[derive(Debug, Default)]
struct RecordBuilder {
    business: BusinessBuilder,
    performance: PerformanceBuilder,
    quality: QualityBuilder,
    linguistic: LinguisticBuilder,
    geographical: GeographicalBuilder,
    system: SystemBuilder,
}

impl BusinessBuilder {
    fn finish(self) -> BusinessMetrics {
        BusinessMetrics {
            new_leads: self.new_leads.unwrap_or(0.0),
            lead_growth: self.lead_growth.unwrap_or(0.0),
            active_conversations: self.active_conversations.unwrap_or(0.0),
            conversation_growth: self.conversation_growth.unwrap_or(0.0),
            whatsapp_conversations: self.whatsapp_conversations.unwrap_or(0.0),
            voice_conversations: self.voice_conversations.unwrap_or(0.0),
            web_conversations: self.web_conversations.unwrap_or(0.0),
            total_revenue: self.total_revenue.unwrap_or(0.0),
            revenue_growth: self.revenue_growth.unwrap_or(0.0),
        }
    }
}

impl PerformanceBuilder {
    fn finish(self) -> PerformanceMetrics {
        PerformanceMetrics {
            response_time: self.response_time.unwrap_or(0.0),
            response_time_change: self.response_time_change.unwrap_or(0.0),
            throughput: self.throughput.unwrap_or(0.0),
            throughput_change: self.throughput_change.unwrap_or(0.0),
            error_count: self.error_count.unwrap_or(0.0),
            error_change: self.error_change.unwrap_or(0.0),
        }
    }
}

impl QualityBuilder {
    fn finish(self) -> QualityMetrics {
        QualityMetrics {
            success_rate: self.success_rate.unwrap_or(0.0),
            success_rate_change: self.success_rate_change.unwrap_or(0.0),
            error_rate: self.error_rate.unwrap_or(0.0),
            error_rate_change: self.error_rate_change.unwrap_or(0.0),
            user_satisfaction: self.user_satisfaction.unwrap_or(0.0),
            satisfaction_change: self.satisfaction_change.unwrap_or(0.0),
        }
    }
}

impl LinguisticBuilder {
    fn finish(self) -> LinguisticMetrics {
        LinguisticMetrics {
            italian_conversations: self.italian_conversations.unwrap_or(0.0),
            english_conversations: self.english_conversations.unwrap_or(0.0),
            french_conversations: self.french_conversations.unwrap_or(0.0),
            spanish_conversations: self.spanish_conversations.unwrap_or(0.0),
            arabic_conversations: self.arabic_conversations.unwrap_or(0.0),
            total_languages: self.total_languages.unwrap_or(0.0),
        }
    }
}

impl GeographicalBuilder {
    fn finish(self) -> GeographicalMetrics {
        GeographicalMetrics {
            italy_users: self.italy_users.unwrap_or(0.0),
            europe_users: self.europe_users.unwrap_or(0.0),
            usa_users: self.usa_users.unwrap_or(0.0),
            other_users: self.other_users.unwrap_or(0.0),
            total_countries: self.total_countries.unwrap_or(0.0),
        }
    }
}

impl SystemBuilder {
    fn finish(self) -> SystemMetrics {
        SystemMetrics {
            cpu_usage: self.cpu_usage.unwrap_or(0.0),
            memory_usage: self.memory_usage.unwrap_or(0.0),
            disk_usage: self.disk_usage.unwrap_or(0.0),
            uptime: self.uptime.unwrap_or(0.0),
            health_status: self.health_status.unwrap_or(0.0),
            last_backup: self.last_backup.unwrap_or_else(now_timestamp),
        }
    }
}

impl RecordBuilder {
    /// Convert every builder to its immutable form, defaulting unset numeric
    /// fields to zero and `last_backup` to the current wall-clock time.
    fn finish(self) -> MetricsRecord {
        MetricsRecord {
            business: self.business.finish(),
            performance: self.performance.finish(),
            quality: self.quality.finish(),
            linguistic: self.linguistic.finish(),
            geographical: self.geographical.finish(),
            system: self.system.finish(),
        }
    }
}

/// UTC timestamp in the shape the feed itself uses for `last_backup`.
fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// --- Known-metric dispatch ---

/// One recognized feed metric: unit conversion plus destination setter.
struct KnownMetric {
    name: &'static str,
    convert: fn(f64) -> f64,
    store: fn(&mut RecordBuilder, f64),
}

/// Fixed mapping of feed metric names to record fields.
///
/// Names outside this table are ignored. A repeated name overwrites the
/// earlier value: the feed is read as one scalar series per name, with no
/// per-label aggregation.
const KNOWN_METRICS: &[KnownMetric] = &[
    KnownMetric {
        name: "sofia_new_leads_total",
        convert: |v| v,
        store: |b, v| b.business.new_leads = Some(v),
    },
    KnownMetric {
        name: "sofia_active_conversations",
        convert: |v| v,
        store: |b, v| b.business.active_conversations = Some(v),
    },
    KnownMetric {
        name: "sofia_response_time_seconds",
        // seconds -> milliseconds
        convert: |v| v * 1000.0,
        store: |b, v| b.performance.response_time = Some(v),
    },
    KnownMetric {
        name: "sofia_error_rate",
        convert: |v| v,
        store: |b, v| b.quality.error_rate = Some(v),
    },
    KnownMetric {
        name: "sofia_success_rate",
        convert: |v| v,
        store: |b, v| b.quality.success_rate = Some(v),
    },
    KnownMetric {
        name: "sofia_cpu_usage",
        convert: |v| v,
        store: |b, v| b.system.cpu_usage = Some(v),
    },
    KnownMetric {
        name: "sofia_memory_usage",
        convert: |v| v,
        store: |b, v| b.system.memory_usage = Some(v),
    },
    KnownMetric {
        name: "sofia_uptime_seconds",
        // seconds -> hours
        convert: |v| v / 3600.0,
        store: |b, v| b.system.uptime = Some(v),
    },
];

fn dispatch(builder: &mut RecordBuilder, sample: &RawSample<'_>) {
    if let Some(metric) = KNOWN_METRICS.iter().find(|m| m.name == sample.name) {
        (metric.store)(builder, (metric.convert)(sample.value));
    }
}

// --- Required-field validation ---

/// Metric paths that must be observed in the feed for a parse to succeed.
///
/// Every other field has a usable zero default; these eight are load-bearing
/// for the dashboard, so their absence signals a degraded or incompatible
/// upstream rather than a benign gap.
const REQUIRED_METRICS: &[(&str, fn(&RecordBuilder) -> bool)] = &[
    ("business.new_leads", |b| b.business.new_leads.is_some()),
    ("business.active_conversations", |b| {
        b.business.active_conversations.is_some()
    }),
    ("performance.response_time", |b| {
        b.performance.response_time.is_some()
    }),
    ("quality.error_rate", |b| b.quality.error_rate.is_some()),
    ("quality.success_rate", |b| b.quality.success_rate.is_some()),
    ("system.cpu_usage", |b| b.system.cpu_usage.is_some()),
    ("system.memory_usage", |b| b.system.memory_usage.is_some()),
    ("system.uptime", |b| b.system.uptime.is_some()),
];

/// Every required path not observed in the feed, in declaration order.
fn missing_metrics(builder: &RecordBuilder) -> Vec<&'static str> {
    REQUIRED_METRICS
        .iter()
        .filter(|(_, observed)| !observed(builder))
        .map(|(path, _)| *path)
        .collect()
}

/// Parse failure: the feed was readable but required metrics never appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// One or more required metric paths were absent from the feed.
    /// Carries every missing path, not just the first.
    MissingMetrics { paths: Vec<&'static str> },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingMetrics { paths } => {
                write!(f, "Metriche mancanti: {}", paths.join(", "))
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse the raw exposition text into a `MetricsRecord`.
///
/// Single linear pipeline: tokenize, dispatch known metrics into the
/// builders, validate the required paths, then assemble with defaults.
/// Pure and synchronous; the caller owns the returned record outright.
pub fn parse_metrics(text: &str) -> Result<MetricsRecord, ParseError> {
    let mut builder = RecordBuilder::default();
    for sample in samples(text) {
        dispatch(&mut builder, &sample);
    }

    let missing = missing_metrics(&builder);
    if !missing.is_empty() {
        return Err(ParseError::MissingMetrics { paths: missing });
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A feed containing exactly the eight required metrics.
    const REQUIRED_FEED: &str = "\
sofia_new_leads_total 42
sofia_active_conversations 7
sofia_response_time_seconds 0.25
sofia_error_rate 0.03
sofia_success_rate 0.97
sofia_cpu_usage 41.5
sofia_memory_usage 68.2
sofia_uptime_seconds 7200
";

    const ALL_REQUIRED_PATHS: &[&str] = &[
        "business.new_leads",
        "business.active_conversations",
        "performance.response_time",
        "quality.error_rate",
        "quality.success_rate",
        "system.cpu_usage",
        "system.memory_usage",
        "system.uptime",
    ];

    #[test]
    fn test_parses_complete_feed() {
        let record = parse_metrics(REQUIRED_FEED).unwrap();
        assert_eq!(record.business.new_leads, 42.0);
        assert_eq!(record.business.active_conversations, 7.0);
        assert_eq!(record.quality.error_rate, 0.03);
        assert_eq!(record.quality.success_rate, 0.97);
        assert_eq!(record.system.cpu_usage, 41.5);
        assert_eq!(record.system.memory_usage, 68.2);
    }

    #[test]
    fn test_response_time_converted_to_milliseconds() {
        let record = parse_metrics(REQUIRED_FEED).unwrap();
        assert_eq!(record.performance.response_time, 250.0);
    }

    #[test]
    fn test_uptime_converted_to_hours() {
        let record = parse_metrics(REQUIRED_FEED).unwrap();
        assert_eq!(record.system.uptime, 2.0);
    }

    #[test]
    fn test_empty_input_reports_all_required_paths() {
        let err = parse_metrics("").unwrap_err();
        let ParseError::MissingMetrics { paths } = err;
        assert_eq!(paths, ALL_REQUIRED_PATHS);
    }

    #[test]
    fn test_missing_metrics_message_is_stable() {
        let err = parse_metrics("").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Metriche mancanti: business.new_leads, business.active_conversations, \
             performance.response_time, quality.error_rate, quality.success_rate, \
             system.cpu_usage, system.memory_usage, system.uptime"
        );
    }

    #[test]
    fn test_single_missing_metric_reported_alone() {
        let feed = REQUIRED_FEED.replace("sofia_memory_usage 68.2\n", "");
        let err = parse_metrics(&feed).unwrap_err();
        assert_eq!(err.to_string(), "Metriche mancanti: system.memory_usage");
    }

    #[test]
    fn test_multiple_missing_metrics_comma_joined() {
        let feed = "sofia_new_leads_total 1\nsofia_active_conversations 2\n\
                    sofia_response_time_seconds 0.1\nsofia_error_rate 0.5\n\
                    sofia_success_rate 0.5\nsofia_cpu_usage 10\n";
        let err = parse_metrics(feed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Metriche mancanti: system.memory_usage, system.uptime"
        );
    }

    #[test]
    fn test_unknown_metrics_comments_and_blanks_ignored() {
        let feed = format!(
            "# HELP sofia_new_leads_total Total new leads\n\
             # TYPE sofia_new_leads_total counter\n\n\
             some_other_exporter_metric 9999\n{REQUIRED_FEED}\n\
             trailing_unknown_metric 1\n"
        );
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record, parse_metrics(REQUIRED_FEED).unwrap());
    }

    #[test]
    fn test_last_write_wins_on_duplicate_metric() {
        let feed = format!("sofia_cpu_usage 10\n{REQUIRED_FEED}sofia_cpu_usage 55\n");
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record.system.cpu_usage, 55.0);
    }

    #[test]
    fn test_unset_fields_default_to_zero() {
        let record = parse_metrics(REQUIRED_FEED).unwrap();
        assert_eq!(record.business.lead_growth, 0.0);
        assert_eq!(record.business.whatsapp_conversations, 0.0);
        assert_eq!(record.business.total_revenue, 0.0);
        assert_eq!(record.performance.throughput, 0.0);
        assert_eq!(record.performance.error_count, 0.0);
        assert_eq!(record.quality.user_satisfaction, 0.0);
        assert_eq!(record.linguistic.italian_conversations, 0.0);
        assert_eq!(record.linguistic.total_languages, 0.0);
        assert_eq!(record.geographical.italy_users, 0.0);
        assert_eq!(record.geographical.total_countries, 0.0);
        assert_eq!(record.system.disk_usage, 0.0);
        assert_eq!(record.system.health_status, 0.0);
    }

    #[test]
    fn test_last_backup_defaults_to_parse_time() {
        let record = parse_metrics(REQUIRED_FEED).unwrap();
        let parsed =
            chrono::NaiveDateTime::parse_from_str(&record.system.last_backup, "%Y-%m-%dT%H:%M:%SZ")
                .unwrap()
                .and_utc();
        let age = chrono::Utc::now().signed_duration_since(parsed);
        assert!(age.num_seconds().abs() < 60, "timestamp not near now: {parsed}");
    }

    #[test]
    fn test_labels_accepted_but_ignored() {
        let feed = REQUIRED_FEED.replace(
            "sofia_success_rate 0.97",
            "sofia_success_rate{model=\"v2\"} 0.97",
        );
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record, parse_metrics(REQUIRED_FEED).unwrap());
    }

    #[test]
    fn test_malformed_value_drops_line_and_fails_validation() {
        let feed = REQUIRED_FEED.replace("sofia_cpu_usage 41.5", "sofia_cpu_usage notanumber");
        let err = parse_metrics(&feed).unwrap_err();
        assert_eq!(err.to_string(), "Metriche mancanti: system.cpu_usage");
    }

    #[test]
    fn test_unparseable_float_capture_drops_line() {
        // Matches the line shape but fails float parsing
        let feed = REQUIRED_FEED.replace("sofia_cpu_usage 41.5", "sofia_cpu_usage 4.1.5");
        let err = parse_metrics(&feed).unwrap_err();
        assert_eq!(err.to_string(), "Metriche mancanti: system.cpu_usage");
    }

    #[test]
    fn test_samples_yields_name_labels_and_value() {
        let got: Vec<_> = samples("foo{instance=\"a\"} 1.5\nbar -12.5\n").collect();
        assert_eq!(
            got,
            vec![
                RawSample {
                    name: "foo",
                    labels: Some("instance=\"a\""),
                    value: 1.5,
                },
                RawSample {
                    name: "bar",
                    labels: None,
                    value: -12.5,
                },
            ]
        );
    }

    #[test]
    fn test_samples_skips_comments_blanks_and_garbage() {
        let text = "# comment\n\n   \nnot a metric line at all!\nfoo 1\n";
        let got: Vec<_> = samples(text).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "foo");
    }

    #[test]
    fn test_leading_whitespace_is_trimmed() {
        let feed = REQUIRED_FEED.replace("sofia_cpu_usage 41.5", "   sofia_cpu_usage 41.5");
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record.system.cpu_usage, 41.5);
    }

    #[test]
    fn test_indented_comment_is_skipped() {
        let feed = format!("   # indented comment\n{REQUIRED_FEED}");
        assert!(parse_metrics(&feed).is_ok());
    }

    #[test]
    fn test_trailing_content_after_value_is_tolerated() {
        // Exposition lines may carry a timestamp after the value
        let feed = REQUIRED_FEED.replace("sofia_cpu_usage 41.5", "sofia_cpu_usage 41.5 1712000000");
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record.system.cpu_usage, 41.5);
    }

    #[test]
    fn test_negative_values_parse() {
        let feed = REQUIRED_FEED.replace("sofia_error_rate 0.03", "sofia_error_rate -0.5");
        let record = parse_metrics(&feed).unwrap();
        assert_eq!(record.quality.error_rate, -0.5);
    }

    #[test]
    fn test_dispatch_table_covers_required_paths() {
        // Feeding every known metric once must satisfy the validator
        let mut builder = RecordBuilder::default();
        for metric in KNOWN_METRICS {
            (metric.store)(&mut builder, (metric.convert)(1.0));
        }
        assert!(missing_metrics(&builder).is_empty());
    }

    #[test]
    fn test_each_conversion_in_isolation() {
        let lookup = |name: &str| KNOWN_METRICS.iter().find(|m| m.name == name).unwrap();
        assert_eq!((lookup("sofia_response_time_seconds").convert)(0.5), 500.0);
        assert_eq!((lookup("sofia_uptime_seconds").convert)(3600.0), 1.0);
        assert_eq!((lookup("sofia_cpu_usage").convert)(77.0), 77.0);
    }
}
