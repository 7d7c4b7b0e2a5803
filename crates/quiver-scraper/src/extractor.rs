//! LLM-driven extraction of arrow specifications from page text

use crate::errors::Result;
use crate::llm::LlmClient;
use crate::text::extract_main_content;
use once_cell::sync::Lazy;
use quiver_core::model::{ArrowSpecification, ArrowType, SpineSpecification};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static OPENING_FENCE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"```(?:json)?\s*").ok());

const PROMPT_TEMPLATE: &str = r#"You are an expert arrow specification extractor. Analyze the webpage content and extract detailed arrow specifications.

Return ONLY a valid JSON object with this exact structure:

{
  "arrows": [
    {
      "model_name": "Complete Arrow Model Name",
      "spine_options": [300, 340, 400, 500],
      "diameter": 0.246,
      "inner_diameter": 0.204,
      "gpi_weight": 8.5,
      "length_options": [28, 29, 30, 31, 32],
      "material": "Carbon Fiber",
      "arrow_type": "target",
      "recommended_use": ["target", "indoor", "outdoor"],
      "description": "Brief description of arrow features and purpose"
    }
  ]
}

REQUIRED FIELDS (must have all to include arrow):
- model_name: Full product name
- spine_options: List of spine stiffness values (numbers like 300, 340, 400)
- diameter: Outer diameter in inches (like 0.246, 0.204)
- gpi_weight: Grains per inch weight (like 8.5, 9.3)

MEASUREMENT FIELDS:
- inner_diameter: Inside diameter if mentioned (ID)
- length_options: Available shaft lengths in inches [28, 29, 30, 31, 32]

USAGE CLASSIFICATION:
- arrow_type: Primary category from: target, hunting, indoor, outdoor, 3d, recreational
- recommended_use: Array of all mentioned uses like ["target", "indoor", "field", "3d"]

DESCRIPTION:
- Extract key features, technology, or selling points in 1-2 sentences

EXTRACTION RULES:
1. Look for technical specifications, charts, tables, product details
2. Spine values are typically 200-900 range (300, 340, 400, 500, etc.)
3. Diameter often shown as "OD" (outer) or "ID" (inner)
4. GPI = Grains Per Inch weight measurement
5. Length usually 28"-32" for target, 30"-33" for hunting
6. Usage keywords: target, hunting, indoor, outdoor, 3d, field, recreational, competition
7. If ranges like "300-500 spine", extract as [300, 340, 400, 500]
8. Skip arrows without complete technical specs
9. Return empty array if no valid arrows found

CONTENT TO ANALYZE:
"#;

const PROMPT_FOOTER: &str =
    "\n\nExtract all arrow models with complete specifications. Focus on technical data and usage descriptions.";

/// Build the extraction prompt around a content excerpt
pub fn build_prompt(excerpt: &str) -> String {
    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + excerpt.len() + PROMPT_FOOTER.len());
    prompt.push_str(PROMPT_TEMPLATE);
    prompt.push_str(excerpt);
    prompt.push_str(PROMPT_FOOTER);
    prompt
}

/// Strip markdown code fences around a JSON answer
pub fn clean_json_response(response: &str) -> String {
    let cleaned = match OPENING_FENCE.as_ref() {
        Some(re) => re.replace_all(response, "").into_owned(),
        None => response.to_string(),
    };
    cleaned.trim().trim_end_matches("```").trim().to_string()
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    arrows: Vec<Value>,
}

/// One arrow as the model reports it, before coercion
#[derive(Debug, Default, Deserialize)]
struct RawArrow {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    spine_options: Value,
    #[serde(default)]
    diameter: Value,
    #[serde(default)]
    inner_diameter: Value,
    #[serde(default)]
    gpi_weight: Value,
    #[serde(default)]
    length_options: Value,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    arrow_type: Option<String>,
    #[serde(default)]
    recommended_use: Value,
    #[serde(default)]
    description: Option<String>,
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('"').trim().parse().ok(),
        _ => None,
    }
}

/// Integers or all-digit strings; anything else is dropped
fn spine_options(value: &Value) -> Vec<u32> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let mut spines: Vec<u32> = items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => s.parse().ok(),
            _ => None,
        })
        .collect();
    spines.sort_unstable();
    spines.dedup();
    spines
}

fn length_options(value: &Value) -> Vec<f64> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(number)
        .filter(|l| *l > 0.0)
        .collect()
}

fn recommended_use(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn convert(raw: RawArrow, source_url: &str, manufacturer: &str) -> std::result::Result<ArrowSpecification, String> {
    let model_name = non_empty(raw.model_name).ok_or("missing model_name")?;
    let spines = spine_options(&raw.spine_options);
    if spines.is_empty() {
        return Err(format!("{model_name}: no usable spine_options"));
    }
    let outer = number(&raw.diameter).ok_or_else(|| format!("{model_name}: missing diameter"))?;
    let gpi = number(&raw.gpi_weight).ok_or_else(|| format!("{model_name}: missing gpi_weight"))?;
    let inner = number(&raw.inner_diameter);
    let lengths = length_options(&raw.length_options);

    let mut specs = Vec::with_capacity(spines.len());
    for spine in spines {
        let mut spec = SpineSpecification::new(spine, outer, gpi).map_err(|e| format!("{model_name}: {e}"))?;
        if let Some(inner) = inner {
            spec = match spec.clone().with_inner_diameter(inner) {
                Ok(with_inner) => with_inner,
                Err(e) => {
                    tracing::debug!(model = %model_name, error = %e, "ignoring inner diameter");
                    spec
                }
            };
        }
        specs.push(spec.with_length_options(lengths.clone()));
    }

    let mut arrow = ArrowSpecification::new(manufacturer, model_name.as_str(), specs, source_url)
        .map_err(|e| format!("{model_name}: {e}"))?;
    arrow.material = non_empty(raw.material);
    arrow.arrow_type = raw.arrow_type.as_deref().and_then(ArrowType::normalize);
    arrow.recommended_use = recommended_use(&raw.recommended_use);
    arrow.description = non_empty(raw.description);
    Ok(arrow)
}

/// Turn a model answer into specifications
///
/// An answer that is not JSON yields no arrows. Entries missing required
/// fields or failing validation are skipped.
pub fn parse_response(response: &str, source_url: &str, manufacturer: &str) -> Vec<ArrowSpecification> {
    let cleaned = clean_json_response(response);
    let payload: ExtractionPayload = match serde_json::from_str(&cleaned) {
        Ok(payload) => payload,
        Err(e) => {
            let preview: String = response.chars().take(200).collect();
            tracing::warn!(url = source_url, error = %e, preview = %preview, "LLM response is not valid JSON");
            return Vec::new();
        }
    };

    payload
        .arrows
        .into_iter()
        .filter_map(|entry| {
            let raw: RawArrow = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(url = source_url, error = %e, "skipping malformed arrow entry");
                    return None;
                }
            };
            match convert(raw, source_url, manufacturer) {
                Ok(arrow) => Some(arrow),
                Err(reason) => {
                    tracing::warn!(url = source_url, reason = %reason, "skipping invalid arrow");
                    None
                }
            }
        })
        .collect()
}

/// Extracts arrow specifications from page text with an LLM
pub struct ArrowExtractor {
    llm: Box<dyn LlmClient>,
}

impl ArrowExtractor {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn provider(&self) -> &'static str {
        self.llm.name()
    }

    /// # Errors
    ///
    /// Propagates LLM transport failures. A usable call with an
    /// unusable answer returns an empty list instead.
    pub async fn extract(
        &self,
        content: &str,
        source_url: &str,
        manufacturer: &str,
    ) -> Result<Vec<ArrowSpecification>> {
        let excerpt = extract_main_content(content);
        tracing::debug!(
            url = source_url,
            content_chars = content.chars().count(),
            excerpt_chars = excerpt.chars().count(),
            provider = self.llm.name(),
            "extracting arrows"
        );
        let answer = self.llm.complete(&build_prompt(&excerpt)).await?;
        let arrows = parse_response(&answer, source_url, manufacturer);
        tracing::info!(url = source_url, arrows = arrows.len(), "extraction finished");
        Ok(arrows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockLlm {
        response: String,
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("CONTENT TO ANALYZE"));
            Ok(self.response.clone())
        }
    }

    const ANSWER: &str = r#"```json
{
  "arrows": [
    {
      "model_name": "Legacy",
      "spine_options": [500, "400", "6OO", 700, 400],
      "diameter": 0.246,
      "inner_diameter": "0.204",
      "gpi_weight": 8.1,
      "length_options": [28, "29", "30.5", "x"],
      "material": "Carbon Fiber",
      "arrow_type": "Outdoor competition",
      "recommended_use": ["Target", "3D"],
      "description": "  Precision target shaft.  "
    },
    { "model_name": "No Specs", "spine_options": [] },
    { "model_name": "Bad Diameter", "spine_options": [300], "diameter": 4.0, "gpi_weight": 9.0 }
  ]
}
```"#;

    #[test]
    fn test_clean_json_response_removes_fences() {
        assert_eq!(clean_json_response("```json\n{\"arrows\": []}\n```"), "{\"arrows\": []}");
        assert_eq!(clean_json_response("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_response_coerces_and_skips() {
        let arrows = parse_response(ANSWER, "https://easton.test/legacy", "Easton");

        assert_eq!(arrows.len(), 1);
        let legacy = &arrows[0];
        assert_eq!(legacy.manufacturer, "Easton");
        assert_eq!(legacy.spine_options(), vec![400, 500, 700]);
        assert_eq!(legacy.arrow_type, Some(ArrowType::Outdoor));
        assert_eq!(legacy.description.as_deref(), Some("Precision target shaft."));
        assert_eq!(legacy.recommended_use, vec!["Target", "3D"]);

        let first = &legacy.spine_specifications[0];
        assert_eq!(first.inner_diameter, Some(0.204));
        assert_eq!(first.length_options, vec![28.0, 29.0, 30.5]);
    }

    #[test]
    fn test_parse_response_non_json_is_empty() {
        assert!(parse_response("I could not find arrows.", "u", "m").is_empty());
        assert!(parse_response("{\"arrows\": []}", "u", "m").is_empty());
    }

    #[test]
    fn test_invalid_inner_diameter_is_ignored() {
        let answer = r#"{"arrows":[{"model_name":"Hunter","spine_options":[340],"diameter":0.298,"inner_diameter":0.5,"gpi_weight":9.3}]}"#;
        let arrows = parse_response(answer, "u", "Gold Tip");
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows[0].spine_specifications[0].inner_diameter, None);
    }

    #[tokio::test]
    async fn test_extract_uses_llm_answer() {
        let extractor = ArrowExtractor::new(Box::new(MockLlm {
            response: ANSWER.to_string(),
        }));
        let arrows = extractor
            .extract("Spine 400 500 700\nDiameter 0.246", "https://easton.test", "Easton")
            .await
            .unwrap();
        assert_eq!(arrows.len(), 1);
        assert_eq!(extractor.provider(), "mock");
    }
}
