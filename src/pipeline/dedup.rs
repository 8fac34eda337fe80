use crate::model::ScrapedFormula;
use std::collections::HashSet;

/// Keeps the first formula seen for each hash, preserving input order.
pub fn dedupe(formulas: Vec<ScrapedFormula>) -> Vec<ScrapedFormula> {
    let mut seen = HashSet::with_capacity(formulas.len());
    formulas
        .into_iter()
        .filter(|formula| seen.insert(formula.hash.clone()))
        .collect()
}
