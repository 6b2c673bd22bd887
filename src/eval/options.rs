/// Knobs for one composition evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Evaluate nested sub-compositions.
    pub recursive: bool,
    /// Run independent graphs of one dependency wave (and array-modifier
    /// indices) on the rayon pool.
    pub parallel_graphs: bool,
    /// Upper bound for an array modifier's `Count`.
    pub max_array_count: u32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            parallel_graphs: true,
            max_array_count: 10_000,
        }
    }
}
