//! Migrator configuration.

use std::path::PathBuf;

/// Environment variable that disables the formatting pass when present.
///
/// Formatting the assembled tree of a very large generated program can use a
/// lot of memory, so huge projects can opt out.
pub const SKIP_FORMATTING_ENV: &str = "BAL_MIGRATE_SKIP_FORMATTING";

/// Configuration for the migrator.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Directory containing legacy flow documents (`*.json`).
    pub source_dir: PathBuf,

    /// Directory the generated Ballerina modules are meant for.
    pub out_dir: PathBuf,

    /// Skip the canonical formatting pass.
    pub skip_formatting: bool,

    /// Indentation width used by the formatter.
    pub indent_width: usize,
}

impl MigratorConfig {
    /// Default configuration with the formatting toggle read from the environment.
    pub fn from_env() -> Self {
        Self {
            skip_formatting: std::env::var_os(SKIP_FORMATTING_ENV).is_some(),
            ..Self::default()
        }
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("flows"),
            out_dir: PathBuf::from("generated"),
            skip_formatting: false,
            indent_width: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this crate that touches the variable.
    #[test]
    fn skip_formatting_follows_environment() {
        std::env::set_var(SKIP_FORMATTING_ENV, "1");
        let skipped = MigratorConfig::from_env();
        std::env::set_var(SKIP_FORMATTING_ENV, "");
        let empty = MigratorConfig::from_env();
        std::env::remove_var(SKIP_FORMATTING_ENV);
        let unset = MigratorConfig::from_env();

        assert!(skipped.skip_formatting);
        assert!(empty.skip_formatting);
        assert!(!unset.skip_formatting);
        assert_eq!(unset.indent_width, 4);
        assert_eq!(unset.out_dir, PathBuf::from("generated"));
    }
}
