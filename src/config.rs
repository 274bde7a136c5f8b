use crate::error::{HiveError, HiveResult};
use crate::optimizer::{Bounds, Hyperparameters};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub colony: ColonyParams,
    #[command(flatten)]
    pub bounds: SearchBounds,
    #[command(flatten)]
    pub checkpoint: CheckpointParams,
    #[command(flatten)]
    pub runtime: RuntimeParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyParams {
    #[arg(long, default_value_t = 50)]
    pub n_pop: usize,
    #[arg(long, default_value_t = 50)]
    pub n_onlooker: usize,
    /// Abandonment limit; defaults to round(0.6 * n_var * n_pop)
    #[arg(long)]
    pub trial_limit: Option<usize>,
    /// Perturbation scale `a`
    #[arg(long, default_value_t = 1.0)]
    pub accel: f64,
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,
}

impl Default for ColonyParams {
    fn default() -> Self {
        Self {
            n_pop: 50,
            n_onlooker: 50,
            trial_limit: None,
            accel: 1.0,
            max_iterations: 200,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBounds {
    #[arg(long, default_value_t = 2)]
    pub n_var: usize,
    /// Comma-separated lower bounds; a single value applies to every dimension
    #[arg(long, default_value = "-5.0", allow_hyphen_values = true)]
    pub var_min: String,
    /// Comma-separated upper bounds; a single value applies to every dimension
    #[arg(long, default_value = "5.0", allow_hyphen_values = true)]
    pub var_max: String,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            n_var: 2,
            var_min: "-5.0".to_string(),
            var_max: "5.0".to_string(),
        }
    }
}

impl SearchBounds {
    pub fn resolve(&self) -> HiveResult<Bounds> {
        if self.n_var == 0 {
            return Err(HiveError::Config("n_var must be positive".into()));
        }
        let min = parse_f64_list(&self.var_min, self.n_var, "var_min")?;
        let max = parse_f64_list(&self.var_max, self.n_var, "var_max")?;
        Ok(Bounds::new(min, max)?)
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointParams {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,
    /// Save every K iterations (the final iteration is always saved)
    #[arg(long, default_value_t = 10)]
    pub checkpoint_every: usize,
    /// Number of most recent checkpoints to retain
    #[arg(long, default_value_t = 3)]
    pub checkpoint_keep: usize,
}

impl Default for CheckpointParams {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("checkpoints"),
            checkpoint_every: 10,
            checkpoint_keep: 3,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeParams {
    /// Evaluation workers; 0 uses every available core
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Per-call objective deadline in milliseconds
    #[arg(long)]
    pub eval_timeout_ms: Option<u64>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> HiveResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlays only the flags the user actually typed, so a config file is not
    /// clobbered by clap defaults.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(colony.n_pop);
        update_if_present!(colony.n_onlooker);
        update_if_present!(colony.trial_limit);
        update_if_present!(colony.accel);
        update_if_present!(colony.max_iterations);

        update_if_present!(bounds.n_var);
        update_if_present!(bounds.var_min);
        update_if_present!(bounds.var_max);

        update_if_present!(checkpoint.checkpoint_dir);
        update_if_present!(checkpoint.checkpoint_every);
        update_if_present!(checkpoint.checkpoint_keep);

        update_if_present!(runtime.workers);
        update_if_present!(runtime.seed);
        update_if_present!(runtime.eval_timeout_ms);
    }

    pub fn validate(&self) -> HiveResult<()> {
        Hyperparameters::try_from(self)?;
        if self.checkpoint.checkpoint_every == 0 {
            return Err(HiveError::Config("checkpoint_every must be positive".into()));
        }
        if self.checkpoint.checkpoint_keep == 0 {
            return Err(HiveError::Config("checkpoint_keep must be positive".into()));
        }
        Ok(())
    }
}

/// Parses a comma-separated list of `n` numbers. A single number is repeated
/// `n` times.
fn parse_f64_list(s: &str, n: usize, name: &str) -> HiveResult<Vec<f64>> {
    let values = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| HiveError::Config(format!("Invalid number '{}' in {}", p.trim(), name)))
        })
        .collect::<HiveResult<Vec<f64>>>()?;

    match values.len() {
        1 => Ok(vec![values[0]; n]),
        len if len == n => Ok(values),
        len => Err(HiveError::Config(format!(
            "--{} requires 1 or {} values (got {})",
            name.replace('_', "-"),
            n,
            len
        ))),
    }
}
