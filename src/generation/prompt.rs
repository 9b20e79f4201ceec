//! Security auditor prompt.

const AUDIT_TEMPLATE: &str = r#"You are an expert cyber security auditor. Analyze the following Python code fragment together with its call context (Callers).

GOAL:
Determine whether a real SECURITY VULNERABILITY exists (e.g. SQL Injection, Command Injection, Hardcoded Secrets).

RULES:
1. If the code places variables into SQL queries or system commands without sanitization, the risk is HIGH.
2. If the Callers suggest the function is internal (e.g. only used by tests or utilities), the risk is LOW.
3. If the Callers suggest the function is exposed (e.g. API handlers, views, controllers), the risk is CRITICAL.

CODE CONTEXT:
{context}

SPECIFIC QUESTION:
Analyze this code for potential vulnerabilities related to: {topic}.

OUTPUT FORMAT (Markdown):
## Vulnerability Detected: [YES/NO]
**Type:** [e.g. SQL Injection / Safe]
**Severity:** [High/Medium/Low]
**Analysis:** [Short technical explanation of why it is dangerous or why it is safe]
**File:** [File name]
"#;

/// Fills the auditor prompt with a retrieval context block and a topic.
pub fn render_audit_prompt(context: &str, topic: &str) -> String {
    // Topic first: a context containing "{topic}" must stay literal
    AUDIT_TEMPLATE
        .replacen("{topic}", topic, 1)
        .replacen("{context}", context, 1)
}
