use crate::error::{Result, TilerError};
use csv::ReaderBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

/// Column holding the subscene id
pub const SCENE_COLUMN: &str = "scene";

/// One row of the classification tags CSV, column name → value
pub type ClassificationTags = BTreeMap<String, String>;

/// What to do when a subscene has no row in the tags table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingTagsPolicy {
    /// Fail the subscene with `MissingClassificationTags`
    #[default]
    Fail,
    /// Continue with an empty tags mapping
    Empty,
}

/// Classification tags keyed by subscene id
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    rows: HashMap<String, ClassificationTags>,
}

impl TagTable {
    pub fn from_csv(path: &Path) -> Result<Self> {
        info!("Reading classification tags: {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| TilerError::file_load(path, e))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = rdr.headers()?.clone();
        if !headers.iter().any(|h| h.trim() == SCENE_COLUMN) {
            return Err(TilerError::InvalidTags(format!(
                "missing '{}' column, found {:?}",
                SCENE_COLUMN,
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let mut rows = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let row: ClassificationTags = headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.trim().to_string(), value.to_string()))
                .collect();

            let Some(scene) = row.get(SCENE_COLUMN).cloned() else {
                continue;
            };
            if rows.contains_key(&scene) {
                warn!("Duplicate tags row for {}, keeping the first", scene);
                continue;
            }
            rows.insert(scene, row);
        }

        info!("Loaded classification tags for {} subscenes", rows.len());
        Ok(Self { rows })
    }

    pub fn get(&self, subscene_id: &str) -> Option<&ClassificationTags> {
        self.rows.get(subscene_id)
    }

    /// Tags row of a subscene, with `policy` deciding what a missing row means
    pub fn resolve(&self, subscene_id: &str, policy: MissingTagsPolicy) -> Result<ClassificationTags> {
        match (self.get(subscene_id), policy) {
            (Some(tags), _) => Ok(tags.clone()),
            (None, MissingTagsPolicy::Empty) => {
                warn!("No classification tags for {}, using an empty mapping", subscene_id);
                Ok(ClassificationTags::new())
            }
            (None, MissingTagsPolicy::Fail) => Err(TilerError::MissingClassificationTags(subscene_id.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
scene,difficulty,shadows_marked,forest
S2A_MSIL1C_20180101,2,1,1
S2B_MSIL1C_20190505,4,0,0
S2A_MSIL1C_20180101,9,9,9
";

    #[test]
    fn test_lookup_by_scene() {
        let table = TagTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let row = table.get("S2B_MSIL1C_20190505").unwrap();
        assert_eq!(row["difficulty"], "4");
        assert_eq!(row[SCENE_COLUMN], "S2B_MSIL1C_20190505");
        assert!(table.get("S2A_unknown").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let table = TagTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.get("S2A_MSIL1C_20180101").unwrap()["difficulty"], "2");
    }

    #[test]
    fn test_resolve_missing_row() {
        let table = TagTable::from_reader(CSV.as_bytes()).unwrap();
        let result = table.resolve("S2A_unknown", MissingTagsPolicy::Fail);
        assert!(matches!(result, Err(TilerError::MissingClassificationTags(id)) if id == "S2A_unknown"));

        assert!(table.resolve("S2A_unknown", MissingTagsPolicy::Empty).unwrap().is_empty());
        let row = table.resolve("S2B_MSIL1C_20190505", MissingTagsPolicy::Fail).unwrap();
        assert_eq!(row["forest"], "0");
    }

    #[test]
    fn test_missing_scene_column() {
        let result = TagTable::from_reader("id,forest\nx,1\n".as_bytes());
        assert!(matches!(result, Err(TilerError::InvalidTags(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = TagTable::from_csv(Path::new("/nonexistent/tags.csv"));
        assert!(matches!(result, Err(TilerError::FileLoad { .. })));
    }
}
