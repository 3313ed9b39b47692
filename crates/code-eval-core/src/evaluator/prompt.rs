use crate::collector::FileRecord;
use crate::rubric::Rubric;

pub const SYSTEM_PROMPT: &str = "You are an expert code evaluator assistant.";

/// Extensions (lower-case, without the dot) eligible as code samples.
pub const CODE_SAMPLE_EXTENSIONS: &[&str] = &[
    "js", "py", "java", "ts", "jsx", "tsx", "html", "css", "cpp", "c", "h", "go", "rb",
];
pub const MAX_CODE_SAMPLES: usize = 3;
pub const SAMPLE_CHAR_LIMIT: usize = 300;
pub const TRUNCATION_MARKER: &str = "[truncated]";

/// Fully assembled user prompt plus the score ceiling it announces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub max_possible_score: u32,
}

/// Assemble the evaluation prompt from rubric, file listing and code samples.
pub fn build_prompt(files: &[FileRecord], rubric: &Rubric) -> Prompt {
    let max_possible_score = rubric.max_possible_score();
    let text = format!(
        "{intro}\n\n## Evaluation Rubric\n\n{rubric}\n## Repository Files\n\n{listing}\n## Code Samples\n\n{samples}\n{instructions}",
        intro = INTRO,
        rubric = render_rubric(rubric),
        listing = render_file_listing(files),
        samples = render_code_samples(files),
        instructions = instructions(max_possible_score),
    );
    Prompt {
        text,
        max_possible_score,
    }
}

/// One `"<path> (<size> bytes)"` line per record, in collection order.
pub fn render_file_listing(files: &[FileRecord]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!("{} ({} bytes)\n", file.path, file.size));
    }
    out
}

/// First [`MAX_CODE_SAMPLES`] records with a source-code extension, in order.
pub fn select_code_samples(files: &[FileRecord]) -> Vec<&FileRecord> {
    files
        .iter()
        .filter(|file| {
            file.extension()
                .is_some_and(|ext| CODE_SAMPLE_EXTENSIONS.contains(&ext.as_str()))
        })
        .take(MAX_CODE_SAMPLES)
        .collect()
}

pub fn render_code_samples(files: &[FileRecord]) -> String {
    let samples = select_code_samples(files);
    if samples.is_empty() {
        return "No code samples available.\n".to_string();
    }
    let mut out = String::new();
    for file in samples {
        out.push_str(&format!(
            "### {}\n```\n{}\n```\n\n",
            file.path,
            truncate(&file.content, SAMPLE_CHAR_LIMIT)
        ));
    }
    out
}

pub fn render_rubric(rubric: &Rubric) -> String {
    let mut out = String::new();
    for category in rubric.categories() {
        out.push_str(&format!(
            "### {} (max {} points)\n{}\n",
            category.name, category.max_score, category.description
        ));
        for criterion in &category.criteria {
            out.push_str(&format!("- {criterion}\n"));
        }
        out.push('\n');
    }
    out
}

fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "... " + TRUNCATION_MARKER
}

const INTRO: &str = "Evaluate the structure and quality of the repository described below. \
Score it against each rubric category using the file listing and code samples provided.";

fn instructions(max_possible_score: u32) -> String {
    format!(
        "## Instructions

1. Evaluate the repository against every rubric category and award a score no higher than that category's maximum.
2. Add the category scores into a total. The total must not exceed {max}.
3. Respond with exactly two parts and nothing else.

PART 1: a markdown report with this structure:

# Code Structure Evaluation Report

## Summary
**Total Score:** <total>/{max}

## Overall Feedback
<two or three paragraphs of overall feedback>

## Detailed Evaluation
### <category name>
**Score:** <score>/<category max>
<explanation>
(repeat for every rubric category)

---
*Generated by code-eval*

PART 2: a JSON object on its own line:
{{\"score\": <total>, \"maxScore\": {max}}}
",
        max = max_possible_score
    )
}
