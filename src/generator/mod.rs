use crate::attractors::{count_attractor_colors, sample_attractor_seeds, DEFAULT_SYMBOLIC_SIZE_BOUND};
use crate::benchmark_file::{BenchmarkFile, StateId};
use crate::error::{BenchError, BenchResult};
use crate::network::{clear_observability, count_unknown_functions, erase_functions, erasure_candidates};
use crate::sampling::{other_random_seed, sample_prefix, shuffle_truncate};
use biodivine_lib_param_bn::symbolic_async_graph::SymbolicAsyncGraph;
use biodivine_lib_param_bn::BooleanNetwork;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

/// Parameters of one generator run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Only variables with at most this many regulators are erased.
    pub max_erased_arity: usize,
    /// Largest number of simultaneously erased update functions.
    pub max_erased_count: usize,
    pub samples_per_erase_count: usize,
    /// Cap on the number of benchmark files written into one group.
    pub experiments_per_group: usize,
    pub random_seed: u64,
    pub symbolic_size_bound: usize,
    /// Width of one magnitude bucket in bits of the colour count.
    pub group_width_bits: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_erased_arity: 5,
            max_erased_count: 10,
            samples_per_erase_count: 20,
            experiments_per_group: 20,
            random_seed: 1234567890,
            symbolic_size_bound: DEFAULT_SYMBOLIC_SIZE_BOUND,
            group_width_bits: 5,
        }
    }
}

impl GeneratorConfig {
    /// Loads a (possibly partial) configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Magnitude bucket of a positive colour count: `floor(log2(count) / width)`.
pub fn magnitude(count: f64, width_bits: u32) -> usize {
    (count.log2() / f64::from(width_bits)).floor() as usize
}

/// Output directory name for a base model: the file name without the
/// `.aeon` extension and without the `_witness` suffix.
pub fn model_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|it| it.to_string_lossy().to_string())
        .unwrap_or_default();
    file_name.replace(".aeon", "").replace("_witness", "")
}

/// A derived model whose `target` seed is an attractor state in at least
/// one colour.
pub struct Sample {
    pub target: StateId,
    /// Sorted names of the erased variables.
    pub erased: Vec<String>,
    pub network: BooleanNetwork,
    pub colors: f64,
}

pub struct Generator {
    config: GeneratorConfig,
    model: BooleanNetwork,
    seeds: Vec<StateId>,
    candidates: Vec<String>,
    groups: Vec<Vec<Sample>>,
    known: FxHashSet<(StateId, Vec<String>)>,
    rng: StdRng,
}

impl Generator {
    /// Normalises the base model and samples its attractor seeds.
    pub fn new(base_model: &BooleanNetwork, config: GeneratorConfig) -> BenchResult<Self> {
        let model = clear_observability(base_model)?;
        let graph = SymbolicAsyncGraph::new(&model)?;
        let seeds: Vec<StateId> = sample_attractor_seeds(&graph)
            .iter()
            .map(StateId::from)
            .collect();
        let candidates = erasure_candidates(&model, config.max_erased_arity);
        info!("Attractor seeds: {}", seeds.len());
        info!("Erasure candidates: {}", candidates.len());

        Ok(Generator {
            rng: StdRng::seed_from_u64(config.random_seed),
            config,
            model,
            seeds,
            candidates,
            groups: Vec::new(),
            known: FxHashSet::default(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn seeds(&self) -> &[StateId] {
        &self.seeds
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Samples grouped by magnitude; index `i` holds counts in
    /// `[2^(i*width), 2^((i+1)*width))`.
    pub fn groups(&self) -> &[Vec<Sample>] {
        &self.groups
    }

    /// Runs all erasure rounds and fills the magnitude groups.
    pub fn sample(&mut self) -> BenchResult<()> {
        let max_count = self.config.max_erased_count.min(self.candidates.len());
        for fn_count in 1..=max_count {
            info!(">>>>>>>>>>>>>>>>>>>>> ERASE {} <<<<<<<<<<<<<<<<<<<<<<<<<", fn_count);
            for _ in 0..self.config.samples_per_erase_count {
                let mut erased = sample_prefix(&mut self.rng, &mut self.candidates, fn_count);
                erased.sort();
                self.sample_erasure(erased)?;
            }
        }
        Ok(())
    }

    fn sample_erasure(&mut self, erased: Vec<String>) -> BenchResult<()> {
        let network = erase_functions(&self.model, &erased)?;
        let graph = SymbolicAsyncGraph::new(&network)?;
        info!(
            "Erased {:?} ({} unknown), total colors: 2^{}",
            erased,
            count_unknown_functions(&network),
            graph.unit_colors().approx_cardinality().log2().round()
        );

        for seed in self.seeds.clone() {
            let key = (seed.clone(), erased.clone());
            if self.known.contains(&key) {
                debug!("Skipping known pair ({}, {:?}).", seed, erased);
                continue;
            }

            match count_attractor_colors(&graph, &seed.to_bit_vector(), self.config.symbolic_size_bound) {
                Some(count) if count > 0.0 => {
                    let bucket = magnitude(count, self.config.group_width_bits);
                    debug!("Seed {}: 2^{} colors, group {}.", seed, count.log2().round(), bucket);
                    while self.groups.len() <= bucket {
                        self.groups.push(Vec::new());
                    }
                    self.known.insert(key);
                    self.groups[bucket].push(Sample {
                        target: seed,
                        erased: erased.clone(),
                        network: network.clone(),
                        colors: count,
                    });
                }
                Some(_) => debug!("Seed {} is not an attractor state in any colour.", seed),
                None => debug!("Seed {} exceeded the symbolic size bound.", seed),
            }
        }
        Ok(())
    }

    /// Writes every group into `out_dir/group_<i+1>/<j+1>.aeon` and stores the
    /// configuration next to them. Returns the written benchmark files.
    pub fn write(&mut self, out_dir: &Path) -> BenchResult<Vec<PathBuf>> {
        let mut distinct = self.seeds.clone();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 2 && self.groups.iter().any(|g| !g.is_empty()) {
            return Err(BenchError::NotEnoughSeeds(distinct.len()));
        }
        if out_dir.exists() {
            return Err(BenchError::OutputExists(out_dir.to_path_buf()));
        }
        fs::create_dir_all(out_dir)?;
        fs::write(
            out_dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(&self.config)?,
        )?;

        let mut written = Vec::new();
        let width = self.config.group_width_bits as usize;
        let groups = std::mem::take(&mut self.groups);
        for (i, group) in groups.into_iter().enumerate() {
            info!("Group [2^{} ... 2^{}]: {}", i * width, (i + 1) * width, group.len());
            let group_dir = out_dir.join(format!("group_{}", i + 1));
            fs::create_dir(&group_dir)?;

            let retained = shuffle_truncate(&mut self.rng, group, self.config.experiments_per_group);
            for (j, sample) in retained.iter().enumerate() {
                let source = other_random_seed(&mut self.rng, &self.seeds, &sample.target)?;
                let file = BenchmarkFile::new(source, &sample.target, sample.network.to_string());
                let path = group_dir.join(format!("{}.aeon", j + 1));
                file.write(&path)?;
                written.push(path);
            }
            self.groups.push(retained);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOGGLE: &str = r"
        a -| b
        b -| a
        $a: !b
        $b: !a
    ";

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            max_erased_count: 2,
            samples_per_erase_count: 4,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn magnitude_buckets_have_five_bit_width() {
        assert_eq!(magnitude(1.0, 5), 0);
        assert_eq!(magnitude(31.0, 5), 0);
        assert_eq!(magnitude(32.0, 5), 1);
        assert_eq!(magnitude(1023.0, 5), 1);
        assert_eq!(magnitude(1024.0, 5), 2);
    }

    #[test]
    fn model_name_drops_extension_and_witness_suffix() {
        assert_eq!(model_name(Path::new("models/mapk_witness.aeon")), "mapk");
        assert_eq!(model_name(Path::new("tlgl.aeon")), "tlgl");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"max_erased_count": 2}"#).unwrap();
        assert_eq!(config.max_erased_count, 2);
        assert_eq!(config.experiments_per_group, 20);
        assert_eq!(config.random_seed, 1234567890);
    }

    #[test]
    fn samples_are_unique_and_correctly_bucketed() {
        let network = BooleanNetwork::try_from(TOGGLE).unwrap();
        let mut generator = Generator::new(&network, small_config()).unwrap();
        assert_eq!(generator.seeds().len(), 2);
        generator.sample().unwrap();

        let mut keys = Vec::new();
        for (i, group) in generator.groups().iter().enumerate() {
            for sample in group {
                assert_eq!(magnitude(sample.colors, 5), i);
                keys.push((sample.target.clone(), sample.erased.clone()));
            }
        }
        assert!(!keys.is_empty());
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn written_benchmarks_have_distinct_source_and_target() {
        let network = BooleanNetwork::try_from(TOGGLE).unwrap();
        let mut generator = Generator::new(&network, small_config()).unwrap();
        generator.sample().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("toggle");
        let written = generator.write(&out_dir).unwrap();
        assert!(!written.is_empty());
        assert!(out_dir.join("group_1").is_dir());
        assert!(out_dir.join(CONFIG_FILE).is_file());

        for path in written {
            let file = BenchmarkFile::load(&path).unwrap();
            let source = file.source().unwrap();
            let target = file.target().unwrap();
            assert_ne!(source, target);
            assert!(BooleanNetwork::try_from(file.body.as_str()).is_ok());
        }
    }

    #[test]
    fn existing_output_directory_is_rejected() {
        let network = BooleanNetwork::try_from(TOGGLE).unwrap();
        let mut generator = Generator::new(&network, small_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            generator.write(dir.path()),
            Err(BenchError::OutputExists(_))
        ));
    }
}
