/**
Token filter restricting which gold tokens take part in the comparison. A filter is written as a
list of `key=value` clauses separated by `;`, such as `upos=NOUN;Gender=Masc`. The `upos` key
constrains the coarse tag, every other key names a morphological feature.
*/
use crate::error::EvalError;
use crate::token::Token;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

const UPOS_KEY: &str = "upos";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    upos: Option<String>,
    feats: BTreeMap<String, String>,
}

impl Filter {
    /// Returns `true` when the token satisfies every clause of the filter.
    pub fn matches(&self, token: &Token) -> bool {
        if let Some(required) = &self.upos {
            match &token.upos {
                Some(upos) if upos == required => {}
                _ => return false,
            }
        }
        if self.feats.is_empty() {
            return true;
        }
        let feats = match &token.feats {
            Some(feats) => feats,
            None => return false,
        };
        self.feats
            .iter()
            .all(|(name, required)| feats.get(name).is_some_and(|value| value == required))
    }

    pub fn is_empty(&self) -> bool {
        self.upos.is_none() && self.feats.is_empty()
    }
}

impl FromStr for Filter {
    type Err = EvalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = Filter::default();
        for clause in s.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (key, value) = match clause.split_once('=').map(|(k, v)| (k.trim(), v.trim())) {
                Some((k, v)) if !k.is_empty() && !v.is_empty() && !v.contains('=') => (k, v),
                _ => return Err(EvalError::MalformedFilterClause(String::from(clause))),
            };
            let duplicated = if key == UPOS_KEY {
                filter.upos.replace(String::from(value)).is_some()
            } else {
                filter
                    .feats
                    .insert(String::from(key), String::from(value))
                    .is_some()
            };
            if duplicated {
                return Err(EvalError::DuplicateFilterKey(String::from(key)));
            }
        }
        Ok(filter)
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses: Vec<String> = self
            .upos
            .iter()
            .map(|upos| format!("{}={}", UPOS_KEY, upos))
            .chain(self.feats.iter().map(|(k, v)| format!("{}={}", k, v)))
            .collect();
        write!(f, "{}", clauses.join(";"))
    }
}
