use clap::Args;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;

#[derive(Args, Debug)]
pub struct SimiCli {
    /// Minimum similarity score for two frames to count as the same slide
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    similarity_threshold: f32,
}

impl SimiCli {
    pub fn to_args(&self) -> SimiArgs {
        SimiArgs::default().similarity_threshold(self.similarity_threshold)
    }
}

pub struct SimiArgs {
    threshold: f32,
}

impl Default for SimiArgs {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl SimiArgs {
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
