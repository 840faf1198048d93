//! Local-file job sources.
//!
//! Existing jobs come from a saved-search listing exported from the scheduling
//! platform (JSON) or from a directory of YAML rule definitions. The admission
//! candidate comes from a single rule definition file. Fetching the live
//! listing is left to external tooling; only the exported file is read here.

mod error;
mod rule_file;
mod saved_search;


pub use self::error::{LoadError, LoadResult, LoadStatus, Result};
pub use self::rule_file::{load_rule_file, load_rules_dir, RuleDefinition};
pub use self::saved_search::{load_saved_searches, parse_saved_searches, SavedSearchFilter};
