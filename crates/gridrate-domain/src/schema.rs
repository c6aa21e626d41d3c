//! Structured-output contract for word evaluations
//!
//! The same [`EvaluationSchema`] value is rendered into the prompt, handed to
//! the inference engine as the guided-decoding constraint, and used to
//! validate the model's answer. Keeping one contract object avoids drift
//! between what the model is told and what the pipeline accepts.

/// Lowest rating a word can receive
pub const RATING_MIN: i64 = 10;

/// Highest rating a word can receive
pub const RATING_MAX: i64 = 50;

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON string
    String,
    /// JSON integer within an inclusive range
    Integer {
        /// Inclusive lower bound
        min: i64,
        /// Inclusive upper bound
        max: i64,
    },
}

impl FieldKind {
    /// JSON Schema type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer { .. } => "integer",
        }
    }
}

/// Which part of a [`WordEvaluation`](crate::WordEvaluation) a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// The word that was rated
    Word,
    /// Free-text reasoning
    Analysis,
    /// Integer score
    Rating,
}

/// One field of the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as it appears in the JSON object
    pub name: &'static str,
    /// Evaluation part this field maps to
    pub role: FieldRole,
    /// Expected value type
    pub kind: FieldKind,
    /// Human-readable description shown to the model
    pub description: &'static str,
    /// Whether the field must be present
    pub required: bool,
}

/// The structured-output shape the model must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSchema {
    /// Schema title
    pub title: &'static str,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
}

impl EvaluationSchema {
    /// The crossword word evaluation contract: `word`, `analysis`, `rating`
    pub fn word_evaluation() -> Self {
        Self {
            title: "WordEvaluation",
            fields: vec![
                FieldSpec {
                    name: "word",
                    role: FieldRole::Word,
                    kind: FieldKind::String,
                    description: "The evaluated word",
                    required: true,
                },
                FieldSpec {
                    name: "analysis",
                    role: FieldRole::Analysis,
                    kind: FieldKind::String,
                    description: "The chain-of-thought explanation",
                    required: true,
                },
                FieldSpec {
                    name: "rating",
                    role: FieldRole::Rating,
                    kind: FieldKind::Integer {
                        min: RATING_MIN,
                        max: RATING_MAX,
                    },
                    description: "The quality score (integer between 10 and 50)",
                    required: true,
                },
            ],
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up the field carrying a given role
    pub fn field_for(&self, role: FieldRole) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role == role)
    }

    /// Names of all required fields, in declaration order
    pub fn required_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect()
    }
}

impl Default for EvaluationSchema {
    fn default() -> Self {
        Self::word_evaluation()
    }
}
