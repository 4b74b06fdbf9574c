//! Answer composer

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::phrases::{phrases, states_only, Phrases};
use super::template::render_template;
use crate::domain::classifier::{AggregateStatus, ClassificationResult};
use crate::domain::generation::GenerationProvider;
use crate::domain::ingredient::{GlutenStatus, RecipeRecord};
use crate::domain::pipeline::PipelineStage;
use crate::domain::script::{Locale, ScriptNormalizer};
use crate::domain::suggester::SubstitutionSuggestion;
use crate::domain::upstream::UpstreamLimiter;
use crate::domain::DomainError;

const NARRATION_PROMPT: &str = "You rewrite answers about gluten for readers of ${var:language}.\n\
Rewrite the answer below as one short paragraph in ${var:language}.\n\
Use only the facts it states and add nothing.\n\
Keep the exact phrase \"${var:phrase}\".\n\n\
Answer:\n${var:answer}";

/// Everything the composer needs for one answer
#[derive(Debug, Clone, Copy)]
pub struct CompositionInput<'a> {
    pub result: &'a ClassificationResult,
    pub suggestions: &'a [SubstitutionSuggestion],
    /// Language and script of the question
    pub locale: Locale,
    /// Recipes that contributed mentions
    pub recipes: &'a [Arc<RecipeRecord>],
}

/// Final response text
#[derive(Debug, Clone, Serialize)]
pub struct ComposedAnswer {
    pub locale: Locale,
    /// Logical-order text from the fixed templates
    pub text: String,
    /// Shaped, visually ordered rendering of `text`
    pub display_text: String,
    /// Model-written paraphrase, kept only when it states the same status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

/// Renders classification results through fixed per-language templates.
///
/// Every claim in the text comes from the classification result or a
/// suggestion. An optional generation backend may paraphrase the templated
/// answer; the paraphrase is dropped unless it repeats the template's status
/// phrase and no other.
#[derive(Clone)]
pub struct AnswerComposer {
    normalizer: ScriptNormalizer,
    generator: Option<Arc<dyn GenerationProvider>>,
    limiter: UpstreamLimiter,
}

impl fmt::Debug for AnswerComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerComposer")
            .field("narration", &self.generator.is_some())
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl AnswerComposer {
    pub fn new(limiter: UpstreamLimiter) -> Self {
        Self {
            normalizer: ScriptNormalizer::new(),
            generator: None,
            limiter,
        }
    }

    /// Enable grounded narration
    pub fn with_generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn narrates(&self) -> bool {
        self.generator.is_some()
    }

    /// Templated answer plus narration; a failed narration is logged and
    /// left out
    pub async fn compose(&self, input: &CompositionInput<'_>) -> Result<ComposedAnswer, DomainError> {
        let mut answer = self.render(input)?;

        match self.narrate(input, &answer).await {
            Ok(narration) => answer.narration = narration,
            Err(e) => warn!(error = %e, "Narration unavailable, using templated answer"),
        }

        Ok(answer)
    }

    /// Render the templated answer
    pub fn render(&self, input: &CompositionInput<'_>) -> Result<ComposedAnswer, DomainError> {
        let phrases = phrases(input.locale);
        let result = input.result;
        let mut lines = vec![self.status_line(input, phrases)?];

        for recipe in input.recipes {
            let items = recipe_items(input, recipe, phrases.separator);
            if items.is_empty() {
                continue;
            }
            let values = HashMap::from([
                ("recipe", recipe.localized_name(input.locale).to_string()),
                ("items", items),
            ]);
            lines.push(render_template(phrases.recipe, &values)?);
        }

        let mut sources: Vec<String> = result
            .evidence
            .iter()
            .map(|e| e.source.clone().unwrap_or_else(|| e.record.to_string()))
            .collect();
        // Ingredient lists of products come with their own source
        for source in input.recipes.iter().filter_map(|r| r.evidence.as_ref()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        if !sources.is_empty() {
            let evidence = sources.join(phrases.separator);
            lines.push(render_template(
                phrases.evidence,
                &HashMap::from([("evidence", evidence)]),
            )?);
        }

        if !result.caveats.is_empty() {
            lines.push(render_template(
                phrases.caveats,
                &HashMap::from([("caveats", result.caveats.join(phrases.separator))]),
            )?);
        }

        if result.status != AggregateStatus::Unknown {
            let percent = (result.confidence * 100.0).round() as u32;
            lines.push(render_template(
                phrases.confidence,
                &HashMap::from([("confidence", percent.to_string())]),
            )?);
            if result.degraded {
                lines.push(phrases.degraded.to_string());
            }
        }

        if result.status.needs_substitutes() {
            if input.suggestions.is_empty() {
                lines.push(phrases.no_substitute.to_string());
            } else {
                lines.push(phrases.suggestions.to_string());
                for suggestion in input.suggestions {
                    let values = HashMap::from([
                        ("target", suggestion.target.localized_name(input.locale).to_string()),
                        ("source", suggestion.source.localized_name(input.locale).to_string()),
                        ("rationale", phrases.rationale(suggestion.primary_rationale()).to_string()),
                    ]);
                    lines.push(render_template(phrases.suggestion, &values)?);
                }
            }
        }

        let text = lines.join("\n");
        let display_text = self.normalizer.render_for_display(&text);

        debug!(
            locale = %input.locale,
            status = %result.status,
            lines = lines.len(),
            "Composed answer"
        );

        Ok(ComposedAnswer {
            locale: input.locale,
            text,
            display_text,
            narration: None,
        })
    }

    /// Ask the generation backend to paraphrase the templated answer.
    /// `Ok(None)` when narration is disabled or the paraphrase is rejected.
    pub async fn narrate(
        &self,
        input: &CompositionInput<'_>,
        answer: &ComposedAnswer,
    ) -> Result<Option<String>, DomainError> {
        let Some(generator) = &self.generator else {
            return Ok(None);
        };

        let phrases = phrases(input.locale);
        let status = input.result.status;
        let values = HashMap::from([
            ("language", phrases.name.to_string()),
            ("phrase", phrases.status_phrase(status).to_string()),
            ("answer", answer.text.clone()),
        ]);
        let prompt = render_template(NARRATION_PROMPT, &values)?;

        let narration = self
            .limiter
            .call(
                PipelineStage::Composition,
                "generate narration",
                generator.generate(&prompt),
            )
            .await?;
        let narration = narration.trim();

        if narration.is_empty() || !states_only(narration, status, input.locale) {
            debug!(status = %status, "Discarding narration that does not match the verdict");
            return Ok(None);
        }

        Ok(Some(narration.to_string()))
    }

    fn status_line(&self, input: &CompositionInput<'_>, phrases: &Phrases) -> Result<String, DomainError> {
        let names = |status: GlutenStatus| {
            input
                .result
                .records_with(status)
                .iter()
                .map(|r| r.localized_name(input.locale).to_string())
                .collect::<Vec<_>>()
                .join(phrases.separator)
        };

        let values = match input.result.status {
            AggregateStatus::Contains => HashMap::from([("items", names(GlutenStatus::Contains))]),
            AggregateStatus::Free => HashMap::from([("items", names(GlutenStatus::Free))]),
            AggregateStatus::Mixed => HashMap::from([
                ("gluten-items", names(GlutenStatus::Contains)),
                ("free-items", names(GlutenStatus::Free)),
            ]),
            AggregateStatus::Unknown => HashMap::new(),
        };

        Ok(render_template(phrases.status_template(input.result.status), &values)?)
    }
}

/// Names of the mentions a recipe contributed, in order
fn recipe_items(input: &CompositionInput<'_>, recipe: &RecipeRecord, separator: &str) -> String {
    let mut items: Vec<String> = Vec::new();
    for verdict in &input.result.breakdown {
        if verdict.mention.span.recipe.as_ref() != Some(&recipe.id) {
            continue;
        }
        let name = match verdict.record() {
            Some(record) => record.localized_name(input.locale).to_string(),
            None => verdict.mention.span.text.clone(),
        };
        if !items.contains(&name) {
            items.push(name);
        }
    }
    items.join(separator)
}
