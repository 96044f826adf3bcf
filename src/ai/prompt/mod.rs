//! Prompt Builder
//!
//! Turns a [`SourceFile`] into a [`DocumentationRequest`].
//!
//! ## Invariants
//!
//! 1. **Fixed instructions**: the system prompt is the same `&'static str`
//!    for every request; only the user message varies
//! 2. **Bounded content**: source text over the character budget is cut to
//!    exactly `max_chars` characters and [`TRUNCATION_MARKER`] is appended
//! 3. **Seven sections**: the model is asked for [`DOCUMENTATION_SECTIONS`]
//!    in that order

use crate::constants::prompt::{DEFAULT_MAX_CHARS, TRUNCATION_MARKER};
use crate::source::{Language, SourceFile};

// =============================================================================
// Fixed Instructions
// =============================================================================

/// Section headers every generated document must contain, in order
pub const DOCUMENTATION_SECTIONS: [&str; 7] = [
    "## 1. Overview",
    "## 2. Business Logic",
    "## 3. Inputs",
    "## 4. Outputs",
    "## 5. Dependencies",
    "## 6. Data Relationships",
    "## 7. Best Practices Review",
];

pub const SYSTEM_PROMPT: &str = "\
You are a Senior Technical Documentation Specialist working for a Credit Union.
Your job is to analyze legacy code and produce clear, professional documentation
that both technical and non-technical stakeholders can understand.

You have deep expertise in:
- SQL stored procedures and queries
- Power BI DAX measures and calculated columns
- Python scripts
- C++ applications

When analyzing code, you understand Credit Union domain terminology including:
- Member (not \"customer\")
- Share accounts (savings)
- Loan types and products
- Core banking system concepts

---

When given code to analyze, produce a documentation report in Markdown format with these sections, using exactly these headers:

## 1. Overview
A 2-3 sentence plain-English summary of what this code does. Write this for a non-technical manager.

## 2. Business Logic
Explain the business rules and logic implemented in this code. What decisions does it make? What conditions does it check?

## 3. Inputs
List all inputs (parameters, variables, tables, or data sources) the code requires. Format as a table with columns: Name | Type | Description

## 4. Outputs
Describe what the code produces (result sets, calculated values, files, etc.). Format as a table with columns: Name | Type | Description

## 5. Dependencies
List any external dependencies (other procedures, tables, views, functions, or services) this code relies on.

## 6. Data Relationships
For SQL and DAX code that contains joins, explain each join:
- Which tables are being joined
- What type of join (INNER, LEFT, RIGHT, FULL)
- The join condition (which columns link the tables)
- Why this relationship likely exists from a business perspective
For any other code, write \"Not applicable\" under this header.

## 7. Best Practices Review
Evaluate the code against modern best practices. Provide specific, actionable recommendations for improvement in areas such as:
- Readability and naming conventions
- Performance optimization
- Error handling
- Security considerations
- Maintainability

---

Keep your tone professional but accessible. Avoid unnecessary jargon.";

// =============================================================================
// Request
// =============================================================================

/// Everything a provider needs to document one file
#[derive(Debug, Clone)]
pub struct DocumentationRequest {
    pub language: Language,
    pub file_name: String,
    /// Source text, possibly truncated
    pub content: String,
    pub truncated: bool,
    /// Character count before truncation
    pub original_chars: usize,
    pub system: &'static str,
    pub user_message: String,
}

// =============================================================================
// Section Builder
// =============================================================================

#[derive(Debug, Clone)]
enum PromptSection {
    Text(String),
    Field { name: String, value: String },
    Code { fence: String, content: String },
}

/// Assembles the user message from ordered sections
#[derive(Debug, Clone, Default)]
struct MessageBuilder {
    sections: Vec<PromptSection>,
}

impl MessageBuilder {
    fn text(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text(content.into()));
        self
    }

    fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Field {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    fn code(mut self, fence: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            fence: fence.to_string(),
            content: content.to_string(),
        });
        self
    }

    fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Text(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Field { name, value } => {
                    prompt.push_str(&format!("**{}:** {}\n\n", name, value));
                }
                PromptSection::Code { fence, content } => {
                    // Fence must be longer than any backtick run inside the code
                    let ticks = "`".repeat(longest_backtick_run(&content).max(2) + 1);
                    prompt.push_str(&format!("{}{}\n", ticks, fence));
                    prompt.push_str(&content);
                    if !content.ends_with('\n') {
                        prompt.push('\n');
                    }
                    prompt.push_str(&ticks);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

// =============================================================================
// Prompt Builder
// =============================================================================

/// Builds documentation requests under a character budget
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn build(&self, file: &SourceFile) -> DocumentationRequest {
        let original_chars = file.char_count();
        let (content, truncated) = truncate_chars(file.content(), self.max_chars);
        let language = file.language();
        let file_name = file.file_name();

        let user_message = MessageBuilder::default()
            .text(format!(
                "Please analyze the following {} code and generate a documentation report.",
                language.as_str()
            ))
            .field("File Name", &file_name)
            .field("Language", language.tag())
            .field("Data Relationships", relationships_directive(language))
            .text("**Code:**")
            .code(language.fence(), &content)
            .text("Generate the documentation report now.")
            .build();

        DocumentationRequest {
            language,
            file_name,
            content,
            truncated,
            original_chars,
            system: SYSTEM_PROMPT,
            user_message,
        }
    }
}

fn relationships_directive(language: Language) -> &'static str {
    if language.has_data_relationships() {
        "Explain every join in section 6."
    } else {
        "Write \"Not applicable\" in section 6; this language has no joins."
    }
}

/// Cut `text` to its first `max_chars` characters and append the marker.
/// Returns the text unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        None => (text.to_string(), false),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            (out, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sql_file() -> SourceFile {
        SourceFile::from_parts(
            "/legacy/GetMemberByID.sql",
            "CREATE PROCEDURE GetMemberByID @MemberID INT AS\nSELECT * FROM Members m\nJOIN Accounts a ON a.MemberID = m.MemberID;",
        )
    }

    #[test]
    fn test_system_prompt_lists_every_section_in_order() {
        let mut last = 0;
        for header in DOCUMENTATION_SECTIONS {
            let pos = SYSTEM_PROMPT.find(header).expect(header);
            assert!(pos >= last, "{} out of order", header);
            last = pos;
        }
    }

    #[test]
    fn test_user_message_embeds_tag_name_and_code() {
        let request = PromptBuilder::default().build(&sql_file());

        assert_eq!(request.language, Language::Sql);
        assert_eq!(request.file_name, "GetMemberByID.sql");
        assert!(!request.truncated);
        assert!(request.user_message.contains("**File Name:** GetMemberByID.sql"));
        assert!(request.user_message.contains("**Language:** sql"));
        assert!(request.user_message.contains("```sql\nCREATE PROCEDURE"));
        assert!(request.user_message.contains("Explain every join"));
    }

    #[test]
    fn test_system_prompt_is_shared() {
        let a = PromptBuilder::default().build(&sql_file());
        let b = PromptBuilder::default().build(&SourceFile::from_parts("calc.py", "x = 1"));
        assert!(std::ptr::eq(a.system, b.system));
        assert_ne!(a.user_message, b.user_message);
    }

    #[test]
    fn test_non_data_language_gets_not_applicable() {
        let request = PromptBuilder::default().build(&SourceFile::from_parts("m.cpp", "int x;"));
        assert!(request.user_message.contains("Not applicable"));

        let unknown = PromptBuilder::default().build(&SourceFile::from_parts("a.xyz", "?"));
        assert!(unknown.user_message.contains("**Language:** unknown"));
        assert!(unknown.user_message.contains("```text"));
    }

    #[test]
    fn test_fence_outgrows_embedded_backticks() {
        let file = SourceFile::from_parts("doc.py", "s = '''```'''\n");
        let request = PromptBuilder::default().build(&file);
        assert!(request.user_message.contains("````python\n"));
    }

    #[test]
    fn test_truncation_marks_request() {
        let file = SourceFile::from_parts("big.sql", "x".repeat(50));
        let request = PromptBuilder::new(10).build(&file);
        assert!(request.truncated);
        assert_eq!(request.original_chars, 50);
        assert_eq!(request.content, format!("{}{}", "x".repeat(10), TRUNCATION_MARKER));
    }

    proptest! {
        #[test]
        fn prop_under_budget_is_unmodified(text in "\\PC{0,200}", extra in 0usize..50) {
            let budget = text.chars().count() + extra;
            let (out, truncated) = truncate_chars(&text, budget);
            prop_assert!(!truncated);
            prop_assert_eq!(out, text);
        }

        #[test]
        fn prop_over_budget_is_prefix_plus_marker(text in "\\PC{1,300}", budget in 0usize..100) {
            let total = text.chars().count();
            prop_assume!(total > budget);

            let (out, truncated) = truncate_chars(&text, budget);
            let prefix: String = text.chars().take(budget).collect();
            prop_assert!(truncated);
            prop_assert_eq!(&out, &format!("{}{}", prefix, TRUNCATION_MARKER));
            prop_assert!(out.chars().count() <= budget + TRUNCATION_MARKER.chars().count());
        }
    }
}
