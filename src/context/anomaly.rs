//! Coverage anomaly detection (C12): compares the current article batch
//! against a historical baseline to flag unusual volume or source
//! activity, without any LLM call -- this is pure arithmetic over article
//! counts and keyword frequencies.

use std::collections::HashMap;

use crate::model::{Anomaly, AnomalyReport, AnomalySeverity, Article};

/// Tunable thresholds, kept as config fields rather than literals so a
/// deployment can retune sensitivity without a code change.
#[derive(Debug, Clone)]
pub struct AnomalyDetectorConfig {
    pub baseline_days: u32,
    pub volume_spike_ratio: f64,
    pub volume_drop_ratio: f64,
    pub source_spike_ratio: f64,
    pub new_source_floor: usize,
    pub keyword_min_length: usize,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self {
            baseline_days: 30,
            volume_spike_ratio: 1.5,
            volume_drop_ratio: 0.5,
            source_spike_ratio: 2.0,
            new_source_floor: 5,
            keyword_min_length: 4,
        }
    }
}

fn count_by_source<'a>(articles: &'a [Article]) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for article in articles {
        *counts.entry(article.source_name.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Lowercased, alphanumeric-only token counts over article titles, for
/// keywords longer than `min_length` characters (§4.12: "tokens of
/// length > 4").
fn keyword_counts(articles: &[Article], min_length: usize) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for article in articles {
        for word in article.title.split_whitespace() {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            let lower = cleaned.to_lowercase();
            if lower.chars().count() > min_length {
                *counts.entry(lower).or_insert(0) += 1;
            }
        }
    }
    counts
}

fn ranked_keywords(counts: &HashMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// §4.12: topics present in the current top-10 with >=3 mentions that
/// were absent from the baseline's top-20, and topics that were in the
/// baseline's top-10 but have dropped out of the current window
/// entirely. Each list is capped at 3.
fn topic_anomalies(
    current_counts: &HashMap<String, usize>,
    baseline_counts: &HashMap<String, usize>,
) -> (Vec<String>, Vec<String>) {
    if current_counts.is_empty() {
        // §8: an empty current window must not manufacture a
        // `missing_topic` anomaly for every baseline keyword -- an empty
        // window carries no topic signal to compare against the
        // baseline at all, so it yields no topic anomalies (volume_drop,
        // if any, is computed separately).
        return (Vec::new(), Vec::new());
    }

    let current_top_10 = ranked_keywords(current_counts, 10);
    let baseline_top_20: std::collections::HashSet<String> =
        ranked_keywords(baseline_counts, 20).into_iter().map(|(k, _)| k).collect();
    let baseline_top_10 = ranked_keywords(baseline_counts, 10);

    let emerging: Vec<String> = current_top_10
        .into_iter()
        .filter(|(k, count)| *count >= 3 && !baseline_top_20.contains(k))
        .take(3)
        .map(|(k, _)| k)
        .collect();

    let missing: Vec<String> = baseline_top_10
        .into_iter()
        .filter(|(k, _)| !current_counts.contains_key(k))
        .take(3)
        .map(|(k, _)| k)
        .collect();

    (emerging, missing)
}

/// Detect anomalies in `current` relative to `baseline`, normalizing the
/// baseline count to the current window's length so a 30-day baseline
/// can be compared fairly against e.g. a single day's articles.
pub fn detect_anomalies(
    config: &AnomalyDetectorConfig,
    current: &[Article],
    baseline: &[Article],
    current_window_days: u32,
) -> AnomalyReport {
    if baseline.is_empty() {
        return AnomalyReport::no_baseline();
    }

    let normalized_baseline = baseline.len() as f64 * current_window_days as f64
        / config.baseline_days.max(1) as f64;

    let mut anomalies = Vec::new();

    if normalized_baseline > 0.0 {
        let ratio = current.len() as f64 / normalized_baseline;
        if ratio > config.volume_spike_ratio {
            anomalies.push(Anomaly {
                anomaly_type: "volume_spike".to_string(),
                severity: AnomalySeverity::Medium,
                description: format!(
                    "article volume is {ratio:.1}x the normalized baseline ({} vs ~{:.1})",
                    current.len(),
                    normalized_baseline
                ),
            });
        } else if ratio < config.volume_drop_ratio {
            anomalies.push(Anomaly {
                anomaly_type: "volume_drop".to_string(),
                severity: AnomalySeverity::Low,
                description: format!(
                    "article volume is {ratio:.1}x the normalized baseline ({} vs ~{:.1})",
                    current.len(),
                    normalized_baseline
                ),
            });
        }
    }

    let current_sources = count_by_source(current);
    let baseline_sources = count_by_source(baseline);
    let mut source_anomalies: Vec<Anomaly> = Vec::new();
    for (source, &current_count) in &current_sources {
        let baseline_count = baseline_sources.get(source).copied().unwrap_or(0);
        let normalized = baseline_count as f64 * current_window_days as f64
            / config.baseline_days.max(1) as f64;
        if normalized > 0.0 && current_count as f64 / normalized > config.source_spike_ratio {
            source_anomalies.push(Anomaly {
                anomaly_type: "source_spike".to_string(),
                severity: AnomalySeverity::Low,
                description: format!("'{source}' coverage spiked relative to baseline"),
            });
        } else if baseline_count == 0 && current_count >= config.new_source_floor {
            source_anomalies.push(Anomaly {
                anomaly_type: "new_source_active".to_string(),
                severity: AnomalySeverity::Low,
                description: format!(
                    "'{source}' is newly active with {current_count} articles and no baseline coverage"
                ),
            });
        }
    }
    source_anomalies.truncate(2);
    anomalies.extend(source_anomalies);

    let current_keyword_counts = keyword_counts(current, config.keyword_min_length);
    let baseline_keyword_counts = keyword_counts(baseline, config.keyword_min_length);
    let (emerging_topics, missing_topics) =
        topic_anomalies(&current_keyword_counts, &baseline_keyword_counts);

    if !emerging_topics.is_empty() {
        anomalies.push(Anomaly {
            anomaly_type: "emerging_topic".to_string(),
            severity: AnomalySeverity::Low,
            description: format!("emerging topics this period: {}", emerging_topics.join(", ")),
        });
    }
    if !missing_topics.is_empty() {
        anomalies.push(Anomaly {
            anomaly_type: "missing_topic".to_string(),
            severity: AnomalySeverity::Low,
            description: format!(
                "topics prominent in the baseline but absent this period: {}",
                missing_topics.join(", ")
            ),
        });
    }

    let summary = if anomalies.is_empty() {
        "coverage this period is consistent with the historical baseline".to_string()
    } else {
        format!("{} anomaly(s) detected relative to baseline", anomalies.len())
    };

    AnomalyReport {
        has_baseline: true,
        baseline_period: format!("last {} days", config.baseline_days),
        current_period: format!("last {current_window_days} days"),
        current_article_count: current.len(),
        baseline_article_count: baseline.len(),
        anomalies,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(source: &str, content: &str) -> Article {
        titled_article(source, "t", content)
    }

    fn titled_article(source: &str, title: &str, content: &str) -> Article {
        Article {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            source_name: source.to_string(),
            published_at: Some(Utc::now()),
            url: "https://example.com".to_string(),
            content: content.to_string(),
            entities: vec![],
            embedding_summary: None,
        }
    }

    #[test]
    fn no_baseline_short_circuits() {
        let config = AnomalyDetectorConfig::default();
        let report = detect_anomalies(&config, &[], &[], 1);
        assert!(!report.has_baseline);
    }

    #[test]
    fn volume_spike_is_flagged_above_threshold() {
        let config = AnomalyDetectorConfig::default();
        let baseline: Vec<Article> = (0..30).map(|_| article("Daily Times", "routine coverage")).collect();
        let current: Vec<Article> = (0..5).map(|_| article("Daily Times", "breaking coverage")).collect();
        let report = detect_anomalies(&config, &current, &baseline, 1);
        assert!(report.anomalies.iter().any(|a| a.anomaly_type == "volume_spike"));
    }

    #[test]
    fn new_source_active_requires_floor_count() {
        let config = AnomalyDetectorConfig::default();
        let baseline = vec![article("Established Source", "content")];
        let current: Vec<Article> = (0..5).map(|_| article("New Source", "content")).collect();
        let report = detect_anomalies(&config, &current, &baseline, 1);
        assert!(report.anomalies.iter().any(|a| a.anomaly_type == "new_source_active"));
    }

    #[test]
    fn emerging_topic_requires_three_mentions_and_baseline_absence() {
        let config = AnomalyDetectorConfig::default();
        let baseline: Vec<Article> = (0..5)
            .map(|_| titled_article("Daily Times", "Routine zoning meeting update", "x"))
            .collect();
        let current: Vec<Article> = (0..4)
            .map(|_| titled_article("Daily Times", "Wildfire evacuation orders expand", "x"))
            .collect();
        let report = detect_anomalies(&config, &current, &baseline, 1);
        let emerging = report.anomalies.iter().find(|a| a.anomaly_type == "emerging_topic");
        assert!(emerging.is_some());
        assert!(emerging.unwrap().description.contains("evacuation"));
    }

    #[test]
    fn empty_current_window_with_baseline_yields_at_most_volume_drop() {
        let config = AnomalyDetectorConfig::default();
        let baseline: Vec<Article> = (0..5)
            .map(|_| titled_article("Daily Times", "Election campaign finance report", "x"))
            .collect();
        let report = detect_anomalies(&config, &[], &baseline, 1);
        assert!(report.has_baseline);
        assert!(report
            .anomalies
            .iter()
            .all(|a| a.anomaly_type == "volume_drop"));
    }

    #[test]
    fn missing_topic_flags_baseline_terms_absent_from_current() {
        let config = AnomalyDetectorConfig::default();
        let baseline: Vec<Article> = (0..5)
            .map(|_| titled_article("Daily Times", "Election campaign finance report", "x"))
            .collect();
        let current: Vec<Article> = (0..5)
            .map(|_| titled_article("Daily Times", "Routine council budget session", "x"))
            .collect();
        let report = detect_anomalies(&config, &current, &baseline, 1);
        let missing = report.anomalies.iter().find(|a| a.anomaly_type == "missing_topic");
        assert!(missing.is_some());
        assert!(missing.unwrap().description.contains("election"));
    }
}
