use anyhow::{Context, Result};
use aquaforge_core::GrowthCalculator;
use aquaforge_schemas::{
    batch::BatchSnapshot,
    file_formats::{BatchFile, SpeciesFile},
    species::Species,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

const SPECIES_DIR: &str = "1_species";
const BATCHES_DIR: &str = "2_batches";
const HISTORY_DIR: &str = "3_history";

/// A container for the farm data loaded from YAML files: the species catalog and the
/// batches with their last committed population.
pub struct KnowledgeBase {
    pub base_path: PathBuf,
    pub species: HashMap<String, Species>,
    pub batches: HashMap<String, BatchSnapshot>,
    /// The YAML file each batch was loaded from, so commits can rewrite it.
    pub batch_sources: HashMap<String, PathBuf>,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory.
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        tracing::info!("Loading knowledge base from {:?}", base_path);

        let species = load_yaml_files_into_map(
            base_path.join(SPECIES_DIR),
            |file: SpeciesFile| file.species,
            |item: &Species| item.species_id.clone(),
        )?
        .into_iter()
        .map(|(id, (species, _))| (id, species))
        .collect();

        let mut batches = HashMap::new();
        let mut batch_sources = HashMap::new();
        for (id, (batch, source)) in load_yaml_files_into_map(
            base_path.join(BATCHES_DIR),
            |file: BatchFile| file.batches,
            |item: &BatchSnapshot| item.batch_id.clone(),
        )? {
            batch_sources.insert(id.clone(), source);
            batches.insert(id, batch);
        }

        let kb = Self {
            base_path,
            species,
            batches,
            batch_sources,
        };
        tracing::info!(
            species = kb.species.len(),
            batches = kb.batches.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    pub fn batch(&self, batch_id: &str) -> Result<&BatchSnapshot> {
        self.batches
            .get(batch_id)
            .with_context(|| format!("Batch '{}' is not in the knowledge base", batch_id))
    }

    /// The growth calculator for a batch's species, falling back to the default
    /// length-weight relationship when the species is not catalogued.
    pub fn growth_calculator_for(&self, batch: &BatchSnapshot) -> GrowthCalculator {
        match self.species.get(&batch.species_id) {
            Some(species) => GrowthCalculator::for_species(species),
            None => {
                tracing::warn!(
                    batch_id = %batch.batch_id,
                    species_id = %batch.species_id,
                    "species not catalogued, using the default length-weight relation"
                );
                GrowthCalculator::default()
            }
        }
    }

    pub fn history_dir(&self) -> PathBuf {
        self.base_path.join(HISTORY_DIR)
    }

    pub fn biometrics_path(&self, batch_id: &str) -> PathBuf {
        self.history_dir().join(format!("{}.biometrics.csv", batch_id))
    }

    pub fn feedings_path(&self, batch_id: &str) -> PathBuf {
        self.history_dir().join(format!("{}.feedings.csv", batch_id))
    }
}

/// Generic helper to load all YAML files in a directory into a HashMap, remembering the
/// file each item came from. A missing directory yields an empty map.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, (T, PathBuf)>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., BatchFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // A closure to get the key for the map from an item T
{
    let mut map = HashMap::new();
    if !dir_path.as_ref().exists() {
        tracing::warn!("Directory {:?} does not exist, nothing loaded", dir_path.as_ref());
        return Ok(map);
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    // Later files win on duplicate keys, so make "later" deterministic.
    paths.sort();

    for path in paths {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

        for item in extract_vec(file_wrapper) {
            let key = get_key(&item);
            if map.contains_key(&key) {
                tracing::warn!("Duplicate key '{}' in {:?} replaces an earlier definition", key, path);
            }
            map.insert(key, (item, path.clone()));
        }
    }
    Ok(map)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_farm(dir: &Path) {
        fs::create_dir_all(dir.join(SPECIES_DIR)).unwrap();
        fs::create_dir_all(dir.join(BATCHES_DIR)).unwrap();
        fs::write(
            dir.join(SPECIES_DIR).join("species.yaml"),
            r#"schema_version: "1"
species:
  - species_id: SP-TILAPIA
    species_name: Nile tilapia
    scientific_name: Oreochromis niloticus
    length_weight:
      a: 0.0145
      b: 3.02
    optimal_temperature:
      optimal:
        value: 28.0
        unit: "°C"
      range:
        min: 22.0
        max: 32.0
"#,
        )
        .unwrap();
        fs::write(
            dir.join(BATCHES_DIR).join("ponds.yaml"),
            r#"schema_version: "1"
batches:
  - batch_id: LOTE-01
    batch_name: Pond 1
    species_id: SP-TILAPIA
    current_population: 1000
    initial_population: 1000
  - batch_id: LOTE-02
    batch_name: Pond 2
    species_id: SP-UNKNOWN
    current_population: 400
    initial_population: 500
    status: harvested
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_knowledge_base() {
        let dir = tempfile::tempdir().unwrap();
        write_farm(dir.path());

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.species.len(), 1);
        assert_eq!(kb.batches.len(), 2);
        assert_eq!(
            kb.batch_sources["LOTE-02"],
            dir.path().join(BATCHES_DIR).join("ponds.yaml")
        );
        assert_eq!(kb.batch("LOTE-02").unwrap().initial_population, 500);
        assert!(kb.batch("LOTE-99").is_err());
    }

    #[test]
    fn test_growth_calculator_follows_species() {
        let dir = tempfile::tempdir().unwrap();
        write_farm(dir.path());
        let kb = KnowledgeBase::load(dir.path()).unwrap();

        let tilapia = kb.growth_calculator_for(kb.batch("LOTE-01").unwrap());
        assert_eq!(tilapia.length_weight().a, 0.0145);

        let unknown = kb.growth_calculator_for(kb.batch("LOTE-02").unwrap());
        assert_eq!(unknown, GrowthCalculator::default());
    }

    #[test]
    fn test_empty_farm_directory() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert!(kb.batches.is_empty());
        assert!(kb.species.is_empty());
    }
}
