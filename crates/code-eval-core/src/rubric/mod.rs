use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loads rubrics from YAML documents with fallback to the built-in default.
pub mod file_loader;

/// A single scoring category within a rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category key as it appears in the rubric document (e.g. `code_quality`).
    pub name: String,
    /// Maximum points awarded for this category (always > 0).
    pub max_score: u32,
    pub description: String,
    /// Ordered evaluation criteria rendered as bullets in the prompt.
    pub criteria: Vec<String>,
}

impl Category {
    /// Construct a category, validating invariants before returning.
    pub fn new(
        name: impl Into<String>,
        max_score: u32,
        description: impl Into<String>,
        criteria: Vec<String>,
    ) -> Result<Self, RubricValidationError> {
        let category = Self {
            name: name.into(),
            max_score,
            description: description.into(),
            criteria,
        };
        category.validate()?;
        Ok(category)
    }

    pub fn validate(&self) -> Result<(), RubricValidationError> {
        if self.name.trim().is_empty() {
            return Err(RubricValidationError::EmptyName);
        }
        if self.max_score == 0 {
            return Err(RubricValidationError::ZeroMaxScore {
                category: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Scoring schema: ordered categories whose maximums sum to the overall maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rubric {
    categories: Vec<Category>,
}

impl Rubric {
    /// Build a rubric from categories in presentation order.
    pub fn new(categories: Vec<Category>) -> Result<Self, RubricValidationError> {
        if categories.is_empty() {
            return Err(RubricValidationError::Empty);
        }
        for category in &categories {
            category.validate()?;
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Sum of every category's `max_score`.
    pub fn max_possible_score(&self) -> u32 {
        self.categories.iter().map(|c| c.max_score).sum()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        fn category(name: &str, description: &str, criteria: &[&str]) -> Category {
            Category {
                name: name.into(),
                max_score: DEFAULT_CATEGORY_MAX,
                description: description.into(),
                criteria: criteria.iter().map(|c| c.to_string()).collect(),
            }
        }

        Self {
            categories: vec![
                category(
                    "code_organization",
                    "Evaluate how well the code is organized and structured",
                    &[
                        "Clear directory structure that reflects the project's purpose",
                        "Logical grouping of related files and modules",
                        "Consistent file and folder naming conventions",
                        "Appropriate separation of concerns",
                        "Entry points and configuration are easy to locate",
                    ],
                ),
                category(
                    "code_quality",
                    "Evaluate the quality and readability of the code",
                    &[
                        "Consistent formatting and coding style",
                        "Meaningful names for variables, functions and types",
                        "Functions are focused and reasonably sized",
                        "Errors are handled rather than ignored",
                        "Comments and documentation where they add value",
                    ],
                ),
                category(
                    "architecture",
                    "Evaluate the overall architecture and design decisions",
                    &[
                        "Components have clear responsibilities and boundaries",
                        "Dependencies between modules are well managed",
                        "Design choices suit the scale of the project",
                        "The code is structured to be extended and tested",
                    ],
                ),
            ],
        }
    }
}

const DEFAULT_CATEGORY_MAX: u32 = 10;

/// Errors emitted while validating rubric definitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RubricValidationError {
    #[error("rubric must define at least one category")]
    Empty,
    #[error("rubric category name must not be blank")]
    EmptyName,
    #[error("rubric category `{category}` max_score must be greater than 0")]
    ZeroMaxScore { category: String },
}
