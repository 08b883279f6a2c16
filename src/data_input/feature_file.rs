// src/data_input/feature_file.rs

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::data_analysis::aggregate_store::AggregateSnapshot;
use crate::data_input::trial_id::TrialId;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::Column;

/// Contents of one auxiliary feature file.
#[derive(Debug, Clone, Default)]
pub struct FeatureFile {
    /// Feature name, taken from the file stem.
    pub name: String,
    /// Tag name -> trial IDs carrying that tag.
    pub tags: BTreeMap<String, Vec<String>>,
    /// Trial ID -> raw value of the `tags`/`data` column (last row wins).
    pub values: HashMap<String, String>,
}

/// Reads a feature CSV.
///
/// Identity comes from an `id` column, or from `location`, `transect` and
/// `flag` columns composed into `L<l>T<t>F<f>`. A `tags` column (comma
/// separated) feeds the tag map; the `tags` or else `data` column feeds the
/// per-ID value map.
pub fn read_feature_file(path: &Path) -> AnalysisResult<FeatureFile> {
    let malformed = |reason: &str| AnalysisError::MalformedFeatureFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let id_idx = column("id");
    let composed_idx = match (column("location"), column("transect"), column("flag")) {
        (Some(l), Some(t), Some(f)) => Some((l, t, f)),
        _ => None,
    };
    if id_idx.is_none() && composed_idx.is_none() {
        return Err(malformed("no 'id' column and no location/transect/flag columns"));
    }

    let tags_idx = column("tags");
    let value_idx = tags_idx.or_else(|| column("data"));
    if value_idx.is_none() {
        return Err(malformed("no 'tags' or 'data' column"));
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut feature = FeatureFile {
        name,
        ..FeatureFile::default()
    };

    for (row_index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %path.display(), row = row_index + 1, "skipping feature row: {e}");
                continue;
            }
        };
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let id = match (id_idx, composed_idx) {
            (Some(idx), _) => field(idx).to_string(),
            (None, Some((l, t, f))) => TrialId::compose(field(l), field(t), field(f)),
            (None, None) => unreachable!("identity columns checked above"),
        };
        if id.is_empty() {
            continue;
        }

        if let Some(idx) = tags_idx {
            for tag in field(idx).split(',').map(|t| t.trim()).filter(|t| !t.is_empty()) {
                feature.tags.entry(tag.to_string()).or_default().push(id.clone());
            }
        }
        if let Some(idx) = value_idx {
            feature.values.insert(id, field(idx).to_string());
        }
    }

    Ok(feature)
}

/// Tag and value overlays keyed by trial ID, joinable against any snapshot.
#[derive(Debug, Clone, Default)]
pub struct FeatureDictionary {
    tags: BTreeMap<String, Vec<String>>,
    values: BTreeMap<String, HashMap<String, String>>,
}

impl FeatureDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a feature file into the dictionary. A malformed file is logged
    /// and contributes nothing; the return value tells whether it was used.
    pub fn ingest_file(&mut self, path: &Path) -> bool {
        match read_feature_file(path) {
            Ok(feature) => {
                info!(
                    file = %path.display(),
                    tags = feature.tags.len(),
                    values = feature.values.len(),
                    "loaded feature file"
                );
                self.insert(feature);
                true
            }
            Err(e) => {
                warn!("skipping feature file: {e}");
                false
            }
        }
    }

    pub fn insert(&mut self, feature: FeatureFile) {
        for (tag, ids) in feature.tags {
            self.tags.entry(tag).or_default().extend(ids);
        }
        self.values.insert(feature.name, feature.values);
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn ids_for_tag(&self, tag: &str) -> Option<&[String]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    pub fn has_tag(&self, trial_id: &str, tag: &str) -> bool {
        self.ids_for_tag(tag)
            .is_some_and(|ids| ids.iter().any(|id| id == trial_id))
    }

    /// `true` for every snapshot entry whose trial ID carries `tag`.
    pub fn highlight_mask(&self, snapshot: &AggregateSnapshot, tag: &str) -> Vec<bool> {
        snapshot.trial_ids.iter().map(|id| self.has_tag(id, tag)).collect()
    }

    /// Raw feature values aligned to the snapshot's trial ordering.
    pub fn match_values(&self, snapshot: &AggregateSnapshot, feature: &str) -> Vec<Option<String>> {
        let values = self.values.get(feature);
        snapshot
            .trial_ids
            .iter()
            .map(|id| values.and_then(|v| v.get(id)).cloned())
            .collect()
    }

    /// Numeric feature values aligned to the snapshot; non-numeric entries become `None`.
    pub fn match_numeric(&self, snapshot: &AggregateSnapshot, feature: &str) -> Column {
        self.match_values(snapshot, feature)
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(body.as_bytes())
            .unwrap();
        path
    }

    #[test]
    fn tags_are_split_and_grouped_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "surface.csv",
            "id,tags\nL1T1F1,\"crust, wet\"\nL1T1F2,crust\nL1T1F3,\n",
        );
        let feature = read_feature_file(&path).unwrap();
        assert_eq!(feature.name, "surface");
        assert_eq!(feature.tags["crust"], vec!["L1T1F1", "L1T1F2"]);
        assert_eq!(feature.tags["wet"], vec!["L1T1F1"]);
        assert_eq!(feature.values["L1T1F2"], "crust");
    }

    #[test]
    fn id_is_composed_from_location_transect_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "moisture.csv",
            "location,transect,flag,data\n2,1,7,0.31\n2,1,8,n/a\n",
        );
        let feature = read_feature_file(&path).unwrap();
        assert_eq!(feature.values["L2T1F7"], "0.31");
        assert!(feature.tags.is_empty());
    }

    #[test]
    fn missing_identity_columns_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "bad.csv", "name,tags\nfoo,bar\n");
        assert!(matches!(
            read_feature_file(&path),
            Err(AnalysisError::MalformedFeatureFile { .. })
        ));

        let mut dictionary = FeatureDictionary::new();
        assert!(!dictionary.ingest_file(&path));
        assert_eq!(dictionary.tag_names().count(), 0);
        assert_eq!(dictionary.feature_names().count(), 0);
    }
}
