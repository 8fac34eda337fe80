use crate::error::{Result, ScraperError};
use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Selector};

/// How a single strategy reads a value out of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// An attribute on the element itself.
    OwnAttribute(&'static str),
    /// An attribute on the first matching descendant that carries it.
    DescendantAttribute {
        css: &'static str,
        attr: &'static str,
    },
    /// Text of the first matching descendant with non-empty text.
    DescendantText(&'static str),
    /// Text of the first matching descendant only. Later matches are never
    /// consulted, so an empty first match yields nothing.
    FirstText(&'static str),
    /// The element's own text content.
    OwnText,
}

/// A named extraction rule. Values are whitespace-normalized and empty
/// values count as no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub rule: Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    pub strategy: &'static str,
    pub value: String,
}

impl Strategy {
    pub const fn new(name: &'static str, rule: Rule) -> Self {
        Self { name, rule }
    }

    pub fn apply(&self, element: ElementRef) -> Result<Option<String>> {
        let value = match self.rule {
            Rule::OwnAttribute(attr) => element.value().attr(attr).map(normalize_whitespace),
            Rule::DescendantAttribute { css, attr } => {
                let selector = parse_selector(css)?;
                element
                    .select(&selector)
                    .filter_map(|el| el.value().attr(attr))
                    .map(normalize_whitespace)
                    .find(|v| !v.is_empty())
            }
            Rule::DescendantText(css) => {
                let selector = parse_selector(css)?;
                element
                    .select(&selector)
                    .map(|el| element_text(&el))
                    .find(|v| !v.is_empty())
            }
            Rule::FirstText(css) => {
                let selector = parse_selector(css)?;
                element.select(&selector).next().map(|el| element_text(&el))
            }
            Rule::OwnText => Some(element_text(&element)),
        };

        Ok(value.filter(|v| !v.is_empty()))
    }
}

/// Strategies tried in priority order; the first one that yields a value wins.
#[derive(Debug, Clone)]
pub struct StrategyChain {
    strategies: Vec<Strategy>,
}

impl StrategyChain {
    pub fn new(strategies: impl Into<Vec<Strategy>>) -> Self {
        Self {
            strategies: strategies.into(),
        }
    }

    pub fn first_match(&self, element: ElementRef) -> Result<Option<Matched>> {
        for strategy in &self.strategies {
            if let Some(value) = strategy.apply(element)? {
                return Ok(Some(Matched {
                    strategy: strategy.name,
                    value,
                }));
            }
        }
        Ok(None)
    }
}

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ScraperError::SelectorError(format!("{}: {}", css, e)).into())
}

pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}
