// All LLM prompt constants for the generation service.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for job post generation — plain text output.
pub const JOB_POST_SYSTEM: &str = "You are an experienced technical recruiter \
    writing clear, honest job postings. \
    Respond with the job post text only. \
    Do NOT include headings like 'Here is the job post'. \
    Do NOT use markdown code fences.";

/// Job post prompt template. Replace `{grounding_instruction}` and
/// `{job_json}` before sending.
pub const JOB_POST_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Write a complete job posting from the structured job data below. Cover the
role, responsibilities, required skills, and experience level in flowing
prose with short sections. Keep it under 500 words.

JOB DATA:
{job_json}"#;

/// System prompt for skills test generation — enforces JSON-only output.
pub const SKILLS_TEST_SYSTEM: &str = "You are a technical interviewer designing \
    a short skills assessment for a specific role. \
    You MUST respond with valid JSON only — a JSON array of question objects. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Skills test prompt template. Replace `{job_post}` before sending.
pub const SKILLS_TEST_PROMPT_TEMPLATE: &str = r#"Design a skills assessment for the role described in the job post below.

Return a JSON ARRAY of 4 to 6 question objects. Each object must match one
of these EXACT shapes (no extra fields):
[
  {"type": "text", "id": "q1", "prompt": "Describe how you would ..."},
  {"type": "multiple_choice", "id": "q2", "prompt": "Which ...", "options": ["a", "b", "c"]}
]

HARD RULES:
1. `id` values must be unique, short, and stable ("q1", "q2", ...)
2. Every question must be answerable from professional experience with the
   skills named in the job post — no trivia
3. Use "multiple_choice" for at most half of the questions

JOB POST:
{job_post}"#;

/// System prompt for interview question generation — JSON-only output.
pub const INTERVIEW_SYSTEM: &str = "You are a hiring manager preparing a short \
    asynchronous video interview. \
    You MUST respond with valid JSON only — a JSON array of question objects. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Interview questions prompt template.
/// Replace `{job_post}` and `{skills_test}` before sending.
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"Prepare 3 video interview questions for the role described below.

Return a JSON ARRAY where every object has this EXACT shape (no extra fields):
[
  {"type": "video_upload", "id": "v1", "prompt": "Tell us about a time ..."}
]

HARD RULES:
1. `id` values must be unique, short, and stable ("v1", "v2", ...)
2. Do not repeat topics already covered by the skills test below
3. Each question should be answerable in under three minutes

JOB POST:
{job_post}

SKILLS TEST ALREADY IN PLACE (may be empty):
{skills_test}"#;
