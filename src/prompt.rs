//! Instruction prompt for the finance action grammar.
//!
//! The model is asked to answer every user message with exactly one JSON
//! action. The prompt uses the ChatML role markers understood by Qwen-style
//! instruct models.

use crate::catalog::Catalog;

pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";

/// Builds the full prompt for one user turn.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    catalog: Catalog,
}

impl PromptBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Wrap `message` with the system instructions and role markers.
    ///
    /// The message is inserted verbatim. The result ends with an open
    /// assistant turn so generation starts with the reply.
    pub fn build_prompt(&self, message: &str) -> String {
        let system = self.system_prompt();
        format!(
            "{IM_START}system\n{system}{IM_END}\n\
             {IM_START}user\n{message}{IM_END}\n\
             {IM_START}assistant\n"
        )
    }

    fn system_prompt(&self) -> String {
        let expense_list = self.catalog.expense().join(", ");
        let income_list = self.catalog.income().join(", ");
        let fallback = self.catalog.fallback();

        format!(
            r#"You are a smart financial AI assistant.

EXPENSE CATEGORIES: [{expense_list}]
INCOME CATEGORIES: [{income_list}]

TASK: Analyze the user input and return a JSON action. Select the most appropriate category from the lists above.

ACTIONS AND FORMAT:
1. Add Expense:
{{"action":"add_expense","params":{{"amount":number,"category":"Category Name","note":"detailed note"}}}}

2. Add Income:
{{"action":"add_income","params":{{"amount":number,"category":"Category Name","note":"detailed note"}}}}

3. Get Total Expense:
{{"action":"get_total_expense","params":{{"period":"this_month"}}}}
(period: this_month, last_month, this_year)

4. Get Balance:
{{"action":"get_balance","params":{{}}}}

5. Casual Chat:
{{"action":"chat","params":{{"message":"concise response"}}}}

RULES:
- Handle amounts in different formats (e.g., "40k" -> 40000, "$5" -> 5).
- If no exact category match, choose the closest one or "{fallback}".
- ALWAYS return valid JSON. No markdown formatting.
"#
        )
    }
}
