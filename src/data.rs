use crate::config::RetryPolicy;
use crate::fetch::Fetcher;
use crate::types::{Diagnostic, Report};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::warn;

pub type Feature = Map<String, Value>;

/// Fetches every dataset and concatenates their features in URI order.
///
/// A dataset that cannot be fetched or has no features contributes nothing;
/// the run goes on with the rest.
pub async fn collect_features(
    fetcher: &Fetcher,
    uris: &[String],
    policy: &RetryPolicy,
) -> Report<Vec<Feature>> {
    let mut report = Report::new(Vec::new());
    let progress = dataset_progress(uris.len() as u64);
    let fetcher = fetcher.with_progress(progress.clone());

    for uri in uris {
        match fetcher.fetch_json(uri, policy).await {
            Ok(doc) => {
                if !extract_features(&doc, &mut report.value) {
                    let diagnostic = Diagnostic::EmptyFeatures { uri: uri.clone() };
                    progress.suspend(|| warn!("{}", diagnostic));
                    report.push(diagnostic);
                }
            }
            Err(failure) => report.push(failure.to_diagnostic()),
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    println!(
        "Collected {} features from {} datasets",
        report.value.len(),
        uris.len()
    );

    report
}

/// Appends the object entries of `doc["features"]` to `out`.
///
/// Returns `false` when the list is absent or empty. Entries that are not
/// objects are dropped without notice.
pub fn extract_features(doc: &Value, out: &mut Vec<Feature>) -> bool {
    let features = match doc.get("features").and_then(Value::as_array) {
        Some(features) if !features.is_empty() => features,
        _ => return false,
    };

    out.extend(features.iter().filter_map(Value::as_object).cloned());
    true
}

fn dataset_progress(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let template = "Fetching datasets {bar:40.cyan/blue} {pos}/{len} dataset \
                    [{elapsed_precise}<{eta_precise}]";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick() -> RetryPolicy {
        RetryPolicy {
            tries: 2,
            timeout_secs: 5.0,
            backoff: 1.5,
            delay_unit_ms: 1,
        }
    }

    #[test]
    fn test_extract_drops_non_objects() {
        let doc = json!({"features": [{"id": 1}, 5, "x", null, [1], {"id": 2}]});
        let mut out = Vec::new();

        assert!(extract_features(&doc, &mut out));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["id"], json!(1));
        assert_eq!(out[1]["id"], json!(2));
    }

    #[test]
    fn test_extract_reports_missing_or_empty() {
        let mut out = Vec::new();
        assert!(!extract_features(&json!({"features": []}), &mut out));
        assert!(!extract_features(&json!({"type": "FeatureCollection"}), &mut out));
        assert!(!extract_features(&json!({"features": null}), &mut out));
        assert!(!extract_features(&json!([1, 2]), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn test_list_of_only_junk_still_counts_as_present() {
        let mut out = Vec::new();
        assert!(extract_features(&json!({"features": [1, 2]}), &mut out));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_collect_tolerates_failing_and_empty_datasets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [{"properties": {"identifier": "A1"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "features": [
                    {"properties": {"identifier": "B1"}},
                    {"properties": {"identifier": "B2"}}
                ]
            })))
            .mount(&server)
            .await;

        let uris: Vec<String> = ["/a", "/broken", "/empty", "/b"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        let report = collect_features(&Fetcher::new(), &uris, &quick()).await;

        let ids: Vec<&Value> = report
            .value
            .iter()
            .map(|f| &f["properties"]["identifier"])
            .collect();
        assert_eq!(ids, vec![&json!("A1"), &json!("B1"), &json!("B2")]);

        assert_eq!(report.diagnostics.len(), 2);
        assert!(matches!(
            &report.diagnostics[0],
            Diagnostic::FetchFailed { url, tries: 2, .. } if url.ends_with("/broken")
        ));
        assert!(matches!(
            &report.diagnostics[1],
            Diagnostic::EmptyFeatures { uri } if uri.ends_with("/empty")
        ));
    }
}
