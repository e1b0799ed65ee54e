/// Whether structural contract checks run during rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Every hook order, child count, child type and key check is enforced.
    Strict,
    /// Checks are skipped; well-formed components are trusted.
    Fast,
}

impl Default for BuildMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Strict
        } else {
            BuildMode::Fast
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub mode: BuildMode,
    /// Consecutive frames in which rendering itself changed state before the
    /// runtime reports a feedback loop. Only consulted in strict mode.
    pub max_chained_frames: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        match BuildMode::default() {
            BuildMode::Strict => Self::strict(),
            BuildMode::Fast => Self::fast(),
        }
    }
}

impl Config {
    pub fn strict() -> Self {
        Self {
            mode: BuildMode::Strict,
            max_chained_frames: Some(64),
        }
    }

    pub fn fast() -> Self {
        Self {
            mode: BuildMode::Fast,
            max_chained_frames: None,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == BuildMode::Strict
    }
}
