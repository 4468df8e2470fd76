use std::path::PathBuf;

use labelcure_core::{ClassNames, CurationPolicy, DatasetLayout, ParseMode};

/// Backup directory used when none is configured, relative to the working
/// directory.
pub const DEFAULT_BACKUP_DIR: &str = "cure_backup";

/// Inputs of one review session.
#[derive(Clone, Debug)]
pub struct ReviewConfig {
    pub ledger_path: PathBuf,
    pub dataset: DatasetLayout,
    pub backup_dir: PathBuf,
    pub policy: CurationPolicy,
    pub class_names: ClassNames,
    /// How malformed ledger lines are handled when the session opens.
    pub parse_mode: ParseMode,
}

impl ReviewConfig {
    pub fn new(ledger_path: impl Into<PathBuf>, dataset: DatasetLayout) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            dataset,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            policy: CurationPolicy::default(),
            class_names: ClassNames::default(),
            parse_mode: ParseMode::default(),
        }
    }

    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    pub fn with_policy(mut self, policy: CurationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_class_names(mut self, names: ClassNames) -> Self {
        self.class_names = names;
        self
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }
}
