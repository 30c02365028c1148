use std::path::PathBuf;

pub const DEFAULT_CASES: &str = "cases.json";

/// Runner configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Store fixture; without one, validators that need a store fail setup.
    pub fixtures: Option<PathBuf>,
    /// Case file (default: `cases.json`).
    pub cases: PathBuf,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default      |
    /// |----------------------|--------------|
    /// | `GUARDRULE_FIXTURES` | unset        |
    /// | `GUARDRULE_CASES`    | `cases.json` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fixtures = lookup("GUARDRULE_FIXTURES")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cases = lookup("GUARDRULE_CASES")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CASES.into());

        Self {
            fixtures,
            cases: PathBuf::from(cases),
        }
    }

    /// A positional argument takes precedence over `GUARDRULE_CASES`.
    pub fn with_cases_arg(mut self, arg: Option<String>) -> Self {
        if let Some(path) = arg {
            self.cases = PathBuf::from(path);
        }
        self
    }
}
