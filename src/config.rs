/*
 * This modules contains some quality of life structs. Most importantly, it contains the
 * `EvalConfig` struct, which implements the default trait. This config can be passed to the
 * `evaluate_conf` function to simplify its arguments, and the `TableOptions` struct, which
 * controls how a `Reporter` is rendered.
*/
use crate::error::Result;
use crate::filter::Filter;
use std::fmt::Display;

#[derive(Clone, Debug, Eq, PartialEq, Default)]
/// Config struct used to simplify the inputs of the main functions of `morpheval`. It implements
/// the default trait.
pub struct EvalConfig {
    /// Only the aligned pairs whose gold token matches the filter are scored. Without filter,
    /// every pair is scored.
    filter: Option<Filter>,
    /// Can we use multiple cores to compute the metrics? The vectors involved are as long as the
    /// number of values of a category, so this rarely pays off.
    parallel: bool,
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl From<(Option<Filter>, bool)> for EvalConfig {
    fn from(value: (Option<Filter>, bool)) -> Self {
        Self {
            filter: value.0,
            parallel: value.1,
        }
    }
}

impl From<EvalConfig> for (Option<Filter>, bool) {
    fn from(value: EvalConfig) -> Self {
        (value.filter, value.parallel)
    }
}

impl Display for EvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filter = match &self.filter {
            Some(filter) => filter.to_string(),
            None => String::from("none"),
        };
        write!(
            f,
            "Filter: {}\n Using parallel computations: {}",
            filter, self.parallel
        )
    }
}

/// This builder can be used to build and customize an `EvalConfig` structure.
#[derive(Clone, Debug, Default)]
pub struct EvalConfigBuilder {
    filter: Option<Filter>,
    parallel: bool,
}

impl EvalConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
    /// Parses a filter written as `key=value;key=value`. Fails on duplicated keys and malformed
    /// clauses.
    pub fn filter_str(self, raw: &str) -> Result<Self> {
        Ok(self.filter(raw.parse()?))
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn build(self) -> EvalConfig {
        EvalConfig {
            filter: self.filter,
            parallel: self.parallel,
        }
    }
}

/// Rendering options of the metrics table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct TableOptions {
    /// Rows ordered by increasing F1 instead of computation order.
    pub sort_by_f1: bool,
    /// Appends the most frequent confusions to each row.
    pub show_errors: bool,
    /// Maximal line length. The confusions are truncated to fit.
    pub max_width: Option<usize>,
}

impl TableOptions {
    pub fn sort_by_f1(mut self, sort_by_f1: bool) -> Self {
        self.sort_by_f1 = sort_by_f1;
        self
    }
    pub fn show_errors(mut self, show_errors: bool) -> Self {
        self.show_errors = show_errors;
        self
    }
    pub fn max_width(mut self, max_width: Option<usize>) -> Self {
        self.max_width = max_width;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::EvalError;
    use rstest::rstest;

    #[test]
    fn test_builder_setters_filter() {
        let builder = EvalConfigBuilder::default();
        let filter: Filter = "upos=NOUN;Case=Nom".parse().unwrap();
        let config = builder.filter(filter.clone()).build();
        assert_eq!(config.filter(), Some(&filter))
    }

    #[test]
    fn test_builder_filter_str() {
        let config = EvalConfigBuilder::new()
            .filter_str("Gender=Masc")
            .unwrap()
            .build();
        assert_eq!(config.filter().unwrap().to_string(), "Gender=Masc");
        let err = EvalConfigBuilder::new().filter_str("upos=NOUN;upos=VERB");
        assert!(matches!(err, Err(EvalError::DuplicateFilterKey(key)) if key == "upos"));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel(), parallel)
    }

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.filter(), None);
        assert!(!config.parallel());
        assert_eq!(
            config.to_string(),
            "Filter: none\n Using parallel computations: false"
        );
        let (filter, parallel) = config.into();
        assert_eq!((filter, parallel), (None, false));
    }

    #[rstest]
    #[case(true, false, None)]
    #[case(false, true, Some(80))]
    fn test_table_options(
        #[case] sort: bool,
        #[case] errors: bool,
        #[case] width: Option<usize>,
    ) {
        let options = TableOptions::default()
            .sort_by_f1(sort)
            .show_errors(errors)
            .max_width(width);
        assert_eq!(
            options,
            TableOptions {
                sort_by_f1: sort,
                show_errors: errors,
                max_width: width
            }
        )
    }
}
