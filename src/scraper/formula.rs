use super::strategy::{element_text, parse_selector, Rule, Strategy, StrategyChain};
use crate::error::Result;
use crate::log_debug;
use crate::model::{ChapterRef, ScrapedFormula};
use crate::utils::truncate_chars;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const FORMULA_DESCRIPTION_LIMIT: usize = 200;
pub const MIN_LATEX_CHARS: usize = 3;
const TITLE_PHRASE_LIMIT: usize = 50;
const LATEX_TITLE_LIMIT: usize = 50;

const EQUATION_SELECTOR: &str = r#"[data-type="equation"], .equation, math"#;
const FORMULA_BLOCK_SELECTOR: &str = r#"[data-type="formula"], .formula"#;

fn title_phrase_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:[a-z][\w'’-]*\s+){0,4}(?:law|theorem|equation|principle|rule)(?:\s+of\s+[a-z][\w'’-]*)?\b",
        )
        .expect("title phrase regex is valid")
    })
}

/// Picks a display title for a formula that has no explicit one.
///
/// A law / theorem / equation phrase of at most 50 characters in the context
/// wins; otherwise the left-hand side of the equation; otherwise the start of
/// the LaTeX itself.
pub fn synthesize_title(latex: &str, context: &str) -> String {
    if let Some(phrase) = title_phrase_regex()
        .find_iter(context)
        .map(|m| m.as_str().trim())
        .find(|phrase| !phrase.is_empty() && phrase.chars().count() <= TITLE_PHRASE_LIMIT)
    {
        return phrase.to_string();
    }

    if let Some((lhs, _)) = latex.split_once('=') {
        let lhs = lhs.trim();
        if !lhs.is_empty() {
            return format!("{} Formula", lhs);
        }
    }

    truncate_chars(latex, LATEX_TITLE_LIMIT)
}

pub struct FormulaScraper<'a> {
    document: &'a Html,
}

impl<'a> FormulaScraper<'a> {
    pub(crate) fn new(document: &'a Html) -> Self {
        Self { document }
    }

    pub fn latex_chain() -> StrategyChain {
        StrategyChain::new([
            Strategy::new("data-math", Rule::OwnAttribute("data-math")),
            Strategy::new(
                "nested-data-math",
                Rule::DescendantAttribute {
                    css: "[data-math]",
                    attr: "data-math",
                },
            ),
            Strategy::new("element-text", Rule::OwnText),
        ])
    }

    pub fn block_latex_chain() -> StrategyChain {
        StrategyChain::new([
            Strategy::new("data-math", Rule::OwnAttribute("data-math")),
            Strategy::new(
                "nested-data-math",
                Rule::DescendantAttribute {
                    css: "[data-math]",
                    attr: "data-math",
                },
            ),
            Strategy::new(
                "nested-latex",
                Rule::DescendantText(".formula-latex, .equation, math"),
            ),
            Strategy::new("element-text", Rule::OwnText),
        ])
    }

    pub fn block_title_chain() -> StrategyChain {
        StrategyChain::new([Strategy::new(
            "nested-title",
            Rule::DescendantText(r#".formula-title, [data-type="title"], h3, h4"#),
        )])
    }

    pub fn block_description_chain() -> StrategyChain {
        StrategyChain::new([Strategy::new(
            "nested-description",
            Rule::DescendantText(".formula-description, p"),
        )])
    }

    /// Runs both passes and returns this chapter's formulas, equations first.
    pub fn extract(&self, chapter: ChapterRef, source_url: &str) -> Result<Vec<ScrapedFormula>> {
        let mut formulas = self.extract_equations(chapter, source_url)?;
        let equation_count = formulas.len();

        let mut seen: HashSet<String> = formulas.iter().map(|f| f.hash.clone()).collect();
        for formula in self.extract_blocks(chapter, source_url)? {
            if seen.insert(formula.hash.clone()) {
                formulas.push(formula);
            }
        }

        log_debug!(
            "[scraper] {}: {} equations, {} formula blocks kept",
            chapter,
            equation_count,
            formulas.len() - equation_count
        );
        Ok(formulas)
    }

    fn extract_equations(
        &self,
        chapter: ChapterRef,
        source_url: &str,
    ) -> Result<Vec<ScrapedFormula>> {
        let selector = parse_selector(EQUATION_SELECTOR)?;
        let chain = Self::latex_chain();
        let mut formulas = Vec::new();

        for element in self.document.select(&selector) {
            let Some(latex) = read_latex(&chain, element)? else {
                continue;
            };
            let context = context_text(&element);
            formulas.push(ScrapedFormula::new(
                chapter,
                synthesize_title(&latex, &context),
                latex,
                truncate_chars(&context, FORMULA_DESCRIPTION_LIMIT),
                source_url,
            ));
        }

        Ok(formulas)
    }

    fn extract_blocks(&self, chapter: ChapterRef, source_url: &str) -> Result<Vec<ScrapedFormula>> {
        let selector = parse_selector(FORMULA_BLOCK_SELECTOR)?;
        let latex_chain = Self::block_latex_chain();
        let title_chain = Self::block_title_chain();
        let description_chain = Self::block_description_chain();
        let mut formulas = Vec::new();

        for block in self.document.select(&selector) {
            let Some(latex) = read_latex(&latex_chain, block)? else {
                continue;
            };
            let context = context_text(&block);

            let title = match title_chain.first_match(block)? {
                Some(matched) => matched.value,
                None => synthesize_title(&latex, &context),
            };
            let description = description_chain
                .first_match(block)?
                .map(|matched| matched.value)
                .unwrap_or(context);

            formulas.push(ScrapedFormula::new(
                chapter,
                title,
                latex,
                truncate_chars(&description, FORMULA_DESCRIPTION_LIMIT),
                source_url,
            ));
        }

        Ok(formulas)
    }
}

/// LaTeX for an element, or `None` when it is missing or too short to be a formula.
fn read_latex(chain: &StrategyChain, element: ElementRef) -> Result<Option<String>> {
    Ok(chain
        .first_match(element)?
        .map(|matched| matched.value)
        .filter(|latex| latex.chars().count() >= MIN_LATEX_CHARS))
}

fn context_text(element: &ElementRef) -> String {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| element_text(&parent))
        .unwrap_or_else(|| element_text(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{formula_hash, Volume};

    const URL: &str = "https://example.org/4-introduction";

    fn extract(html: &str) -> Vec<ScrapedFormula> {
        let document = Html::parse_document(html);
        FormulaScraper::new(&document)
            .extract(ChapterRef::new(Volume::Vol2, 4), URL)
            .unwrap()
    }

    #[test]
    fn title_prefers_law_phrase() {
        assert_eq!(
            synthesize_title("F = ma", "Newton's second law of motion states that"),
            "Newton's second law of motion"
        );
    }

    #[test]
    fn title_falls_back_to_left_hand_side() {
        assert_eq!(synthesize_title("KE = \\frac{1}{2}mv^2", "no keywords here"), "KE Formula");
    }

    #[test]
    fn title_falls_back_to_latex_prefix() {
        let latex = "\\sum_{i}".repeat(10);
        let title = synthesize_title(&latex, "");
        assert_eq!(title.chars().count(), 50);
        assert!(latex.starts_with(&title));

        assert_eq!(synthesize_title("= x + y", ""), "= x + y");
    }

    #[test]
    fn equations_read_data_math_then_text() {
        let formulas = extract(
            r#"<html><body>
                <div class="os-para">Ideal gas law relates the state variables.
                    <div data-type="equation" data-math="PV = nRT">ignored</div>
                </div>
                <div><span class="equation"><span data-math="W = F d"></span></span></div>
                <p><math>a=Δv/Δt</math></p>
            </body></html>"#,
        );

        let latex: Vec<_> = formulas.iter().map(|f| f.latex.as_str()).collect();
        assert_eq!(latex, vec!["PV = nRT", "W = F d", "a=Δv/Δt"]);
        assert_eq!(formulas[0].title, "Ideal gas law");
        assert_eq!(formulas[1].title, "W Formula");
        assert_eq!(formulas[0].chapter, ChapterRef::new(Volume::Vol2, 4));
        assert_eq!(formulas[0].volume, Volume::Vol2);
        assert_eq!(formulas[0].chapter_number, 4);
        assert_eq!(formulas[0].source_url, URL);
        assert_eq!(formulas[0].hash, formula_hash("PV = nRT"));
    }

    #[test]
    fn short_candidates_are_noise() {
        let formulas = extract(
            r#"<html><body>
                <span class="equation">x </span>
                <span class="equation" data-math="  ab  "></span>
                <span class="equation">v=d</span>
            </body></html>"#,
        );
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].latex, "v=d");
    }

    #[test]
    fn formula_blocks_use_nested_title_and_description() {
        let formulas = extract(
            r#"<html><body>
                <div data-type="formula">
                    <h4>Coulomb's Law</h4>
                    <span class="formula-latex">F = k q_1 q_2 / r^2</span>
                    <p class="formula-description">Force between two point charges.</p>
                </div>
            </body></html>"#,
        );
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].title, "Coulomb's Law");
        assert_eq!(formulas[0].latex, "F = k q_1 q_2 / r^2");
        assert_eq!(formulas[0].description, "Force between two point charges.");
    }

    #[test]
    fn short_formula_blocks_are_noise() {
        let formulas = extract(
            r#"<html><body>
                <div class="formula"><h3>Tiny</h3><span data-math="  x  "></span></div>
                <div data-type="formula">  q
                </div>
                <div class="formula"><h3>Work</h3><span data-math="W = F d"></span></div>
            </body></html>"#,
        );
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].title, "Work");
        assert_eq!(formulas[0].latex, "W = F d");
    }

    #[test]
    fn blocks_do_not_repeat_equations_from_the_same_chapter() {
        let formulas = extract(
            r#"<html><body>
                <div class="formula">
                    <h3>Momentum</h3>
                    <span class="equation" data-math="p = m v"></span>
                </div>
                <div class="formula"><span data-math="P=MV"></span></div>
            </body></html>"#,
        );
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].latex, "p = m v");
    }

    #[test]
    fn descriptions_are_bounded() {
        let filler = "Context sentence without keywords. ".repeat(20);
        let formulas = extract(&format!(
            r#"<html><body>
                <div>{filler}<span class="equation">E = mc^2</span></div>
                <div class="formula"><h3>T</h3><span data-math="s = v t"></span><p>{filler}</p></div>
            </body></html>"#
        ));
        assert_eq!(formulas.len(), 2);
        for formula in &formulas {
            assert!(formula.description.chars().count() <= FORMULA_DESCRIPTION_LIMIT);
        }
        assert_eq!(
            formulas[0].description.chars().count(),
            FORMULA_DESCRIPTION_LIMIT
        );
    }

    #[test]
    fn page_without_formulas_is_empty() {
        assert!(extract("<html><body><p>Prose only.</p></body></html>").is_empty());
    }
}
