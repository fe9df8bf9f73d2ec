/// Typed record of the Sofia AI metrics, grouped into semantic categories.
///
/// A `MetricsRecord` is only ever produced by the parser, and only after the
/// required-field validation has passed: every numeric field is populated
/// (zero when absent from the feed) and `last_backup` always carries a
/// timestamp. Consumers never see a sparse or partially-filled record.
use serde::Serialize;

/// The full metrics record handed to the dashboard API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub business: BusinessMetrics,
    pub performance: PerformanceMetrics,
    pub quality: QualityMetrics,
    pub linguistic: LinguisticMetrics,
    pub geographical: GeographicalMetrics,
    pub system: SystemMetrics,
}

/// Lead and conversation volume, split by channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessMetrics {
    pub new_leads: f64,
    pub lead_growth: f64,
    pub active_conversations: f64,
    pub conversation_growth: f64,
    pub whatsapp_conversations: f64,
    pub voice_conversations: f64,
    pub web_conversations: f64,
    pub total_revenue: f64,
    pub revenue_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Response time in milliseconds (the feed reports seconds).
    pub response_time: f64,
    pub response_time_change: f64,
    pub throughput: f64,
    pub throughput_change: f64,
    pub error_count: f64,
    pub error_change: f64,
}

/// Success/error rates as fractions in 0.0–1.0, as published by the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub success_rate: f64,
    pub success_rate_change: f64,
    pub error_rate: f64,
    pub error_rate_change: f64,
    pub user_satisfaction: f64,
    pub satisfaction_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinguisticMetrics {
    pub italian_conversations: f64,
    pub english_conversations: f64,
    pub french_conversations: f64,
    pub spanish_conversations: f64,
    pub arabic_conversations: f64,
    pub total_languages: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicalMetrics {
    pub italy_users: f64,
    pub europe_users: f64,
    pub usa_users: f64,
    pub other_users: f64,
    pub total_countries: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    /// CPU, memory, and disk usage as percentages.
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    /// Uptime in hours (the feed reports seconds).
    pub uptime: f64,
    pub health_status: f64,
    /// UTC timestamp of the last backup; parse time when the feed omits it.
    pub last_backup: String,
}
