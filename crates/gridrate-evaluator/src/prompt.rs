//! LLM prompt engineering for word evaluation

use crate::schema::to_json_schema_string;
use gridrate_domain::{EvaluationSchema, RATING_MAX, RATING_MIN};

/// Builds the evaluation prompt for one word
///
/// The output is a pure function of the word and the schema.
pub struct PromptBuilder<'a> {
    schema: &'a EvaluationSchema,
    schema_text: String,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder for the given contract
    pub fn new(schema: &'a EvaluationSchema) -> Self {
        Self {
            schema,
            schema_text: to_json_schema_string(schema),
        }
    }

    /// The contract this builder renders
    pub fn schema(&self) -> &EvaluationSchema {
        self.schema
    }

    /// Build the complete evaluation prompt
    pub fn build(&self, word: &str) -> String {
        let mut prompt = String::new();

        // 1. Task and scale
        prompt.push_str(&format!(
            "Evaluate the following word for its suitability in a crossword puzzle grid. \
             Rate its quality on a scale from {} to {}, where:\n",
            RATING_MIN, RATING_MAX
        ));
        prompt.push_str(&format!(
            "  - {} indicates a low quality (e.g. typos, unknown or random strings),\n",
            RATING_MIN
        ));
        prompt.push_str(&format!(
            "  - {} indicates a high quality (e.g. common, interesting words).\n\n",
            RATING_MAX
        ));

        // 2. Reason first, JSON last
        prompt.push_str(REASONING_INSTRUCTIONS);

        // 3. Output contract
        prompt.push_str(
            "\nAdditionally, please output your final result in a JSON format that strictly follows this schema:\n",
        );
        prompt.push_str(&self.schema_text);
        prompt.push_str("\nMake sure the JSON object is valid and contains all required fields.\n\n");

        // 4. Few-shot examples
        prompt.push_str(FEW_SHOT_EXAMPLES);

        // 5. The word
        prompt.push_str(&format!("Now, evaluate the word: '{}'.", word));

        prompt
    }

    /// Build prompts for a batch of words, preserving order
    pub fn build_batch(&self, words: &[String]) -> Vec<String> {
        words.iter().map(|w| self.build(w)).collect()
    }
}

const REASONING_INSTRUCTIONS: &str = "Please provide your chain-of-thought reasoning first, \
then on a new line output the final result as exactly one JSON object, as specified.";

const FEW_SHOT_EXAMPLES: &str = r#"For example:
  - For the word 'asdfg': It appears to be a random string or typo, so it should receive a rating of 10.
    Output: {"word": "asdfg", "analysis": "It appears to be a random string or typo.", "rating": 10}

  - For the word 'apple': It is a common and interesting word, making it a good candidate, so it might receive a rating of 50.
    Output: {"word": "apple", "analysis": "It is a common and interesting word.", "rating": 50}

"#;
