use crate::config::RetryPolicy;
use crate::fetch::{FetchFailure, Fetcher};
use serde_json::Value;
use thiserror::Error;

const GRAPH_KEY: &str = "@graph";
const DATASET_KEY: &str = "dcat:dataset";

/// The catalog could not be turned into a URI list. Fatal for the run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog could not be fetched")]
    Fetch(#[from] FetchFailure),
    #[error("catalog is not a JSON object")]
    NotAnObject,
    #[error("catalog `@graph` is not a list")]
    GraphNotAList,
    #[error("dataset entry {index} of the catalog has no `iri` string")]
    MissingIri { index: usize },
}

pub async fn resolve_dataset_uris(
    fetcher: &Fetcher,
    root_url: &str,
    policy: &RetryPolicy,
) -> Result<Vec<String>, CatalogError> {
    let catalog = fetcher.fetch_json(root_url, policy).await?;
    dataset_uris(&catalog)
}

/// Reads the `iri` of every entry in the first graph node that has a
/// dataset relation. Later nodes are ignored.
///
/// A catalog without `@graph` lists no datasets; a catalog that is not an
/// object, or whose `@graph` is not a list, is rejected.
pub fn dataset_uris(catalog: &Value) -> Result<Vec<String>, CatalogError> {
    let catalog = catalog.as_object().ok_or(CatalogError::NotAnObject)?;
    let graph = match catalog.get(GRAPH_KEY) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(graph)) => graph,
        Some(_) => return Err(CatalogError::GraphNotAList),
    };

    let datasets = graph
        .iter()
        .filter_map(|node| node.get(DATASET_KEY))
        .find(|ds| !ds.is_null());

    let Some(datasets) = datasets else {
        return Ok(Vec::new());
    };

    // A single object stands for a one-element relation in JSON-LD.
    let entries: Vec<&Value> = match datasets {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .get("iri")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(CatalogError::MissingIri { index })
        })
        .collect()
}
