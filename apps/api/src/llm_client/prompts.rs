// Prompt fragments shared by every caller of the LLM client.
// Task-specific prompts live next to the service that sends them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to any prompt that sees candidate material.
pub const FAIRNESS_INSTRUCTION: &str = "\
    CRITICAL: Ignore names, gender, age, nationality, photos, addresses and the \
    prestige of schools or employers. Placeholders such as [NAME], [EMAIL], \
    [PHONE] and [INSTITUTION] mark redacted text; never speculate about what \
    they hide. Judge only demonstrated skills and experience.";
