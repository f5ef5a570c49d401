// Shared prompt constants and prompt-building utilities.
// Each agent defines its own templates in agents/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Role framing shared by every agent.
pub const ANALYST_ROLE: &str = "أنت محلل خبير في تجربة العملاء في العالم العربي. \
    تفهم اللغة العربية الفصحى واللهجات الخليجية والمصرية والشامية والمغاربية. \
    You are an expert customer-experience analyst for Arabic-speaking markets.";

/// Builds a system prompt: role framing, agent-specific instruction, JSON rule.
pub fn build_system(agent_instruction: &str) -> String {
    format!("{ANALYST_ROLE}\n\n{agent_instruction}\n\n{JSON_ONLY_SYSTEM}")
}
