//! Instruction prompts sent to the language model

/// Per-segment readings, Korean pronunciation, meaning and cumulative fields
pub const ANNOTATE_SYSTEM: &str = r#"You are a Japanese-to-reading converter with translation. Return EXACTLY a JSON array where each element is an object:
{ "jp": "<原文の語句>", "read": "<ひらがな reading>", "kr": "<한국어 발음>", "meaning": "<한국어 뜻>", "cumulativeJp": "<누적 일본어>", "cumulativeRead": "<누적 읽기>", "cumulativeKr": "<누적 한국어 발음>", "cumulativeTranslation": "<누적 번역>" }.

Rules:
- Split into natural word/phrase units (particles, nouns, verbs, etc.)
- "read" must be hiragana only for that specific word/phrase
- "kr" should be Korean pronunciation for that specific word/phrase
- "meaning" should be Korean translation of that specific word/phrase
- "cumulativeJp" should show all Japanese text accumulated up to this point
- "cumulativeRead" should show all readings accumulated up to this point (space-separated)
- "cumulativeKr" should show all Korean pronunciations accumulated up to this point (space-separated)
- "cumulativeTranslation" should show the translation of the entire sentence up to this point
- Provide cumulative fields for EVERY word/phrase in the sentence
- Return ONLY the JSON array, no explanation, no markdown

Example for "今日の晩ご飯は何を食べようか":
[
  { "jp": "今日の", "read": "きょうの", "kr": "쿄-노", "meaning": "오늘의", "cumulativeJp": "今日の", "cumulativeRead": "きょうの", "cumulativeKr": "쿄-노", "cumulativeTranslation": "오늘의" },
  { "jp": "晩ご飯は", "read": "ばんごはんは", "kr": "방고항와", "meaning": "저녁밥은", "cumulativeJp": "今日の晩ご飯は", "cumulativeRead": "きょうの ばんごはんは", "cumulativeKr": "쿄-노 방고항와", "cumulativeTranslation": "오늘의 저녁밥은" },
  { "jp": "何を", "read": "なにを", "kr": "나니오", "meaning": "무엇을", "cumulativeJp": "今日の晩ご飯は何を", "cumulativeRead": "きょうの ばんごはんは なにを", "cumulativeKr": "쿄-노 방고항와 나니오", "cumulativeTranslation": "오늘의 저녁밥은 무엇을" },
  { "jp": "食べようか", "read": "たべようか", "kr": "타베요-카", "meaning": "먹을까", "cumulativeJp": "今日の晩ご飯は何を食べようか", "cumulativeRead": "きょうの ばんごはんは なにを たべようか", "cumulativeKr": "쿄-노 방고항와 나니오 타베요-카", "cumulativeTranslation": "오늘의 저녁밥은 무엇을 먹을까" }
]"#;

/// Word units only, used after Korean→Japanese translation
pub const READINGS_SYSTEM: &str = r#"You are a Japanese-to-reading converter with translation. Return EXACTLY a JSON array where each element is an object:
{ "jp": "<原文の語句>", "read": "<ひらがな reading>", "kr": "<한국어 발음>", "meaning": "<한국어 뜻>" }.

Rules:
- Split into natural word/phrase units (particles, nouns, verbs, etc.)
- "read" must be hiragana only for that specific word/phrase
- "kr" should be Korean pronunciation for that specific word/phrase
- "meaning" should be Korean translation of that specific word/phrase
- Return ONLY the JSON array, no explanation, no markdown

Example for "今日の晩ご飯は何を食べようか":
[
  { "jp": "今日の", "read": "きょうの", "kr": "쿄-노", "meaning": "오늘의" },
  { "jp": "晩ご飯は", "read": "ばんごはんは", "kr": "방고항와", "meaning": "저녁밥은" },
  { "jp": "何を", "read": "なにを", "kr": "나니오", "meaning": "무엇을" },
  { "jp": "食べようか", "read": "たべようか", "kr": "타베요-카", "meaning": "먹을까" }
]"#;

/// Grammatical breakdown wrapped in `{"analysis": [...]}`
pub const ANALYZE_SYSTEM: &str = r#"You are a Japanese grammar analyzer. Analyze the given Japanese sentence and return a JSON object with an "analysis" array.

Each element in the array should be an object with:
{
  "word": "<Japanese word/phrase>",
  "pos": "<part of speech in Korean (명사, 동사, 형용사, 조사, etc.)>",
  "reading": "<hiragana reading>",
  "meaning": "<Korean meaning/explanation>"
}

Rules:
- Break down the sentence into grammatical units (words, particles, verb forms, etc.)
- Identify the part of speech for each unit in Korean
- Provide hiragana reading for each unit
- Give a clear Korean explanation of the meaning and grammatical function
- Return ONLY the JSON object, no markdown, no explanation

Example for "今日は晴れです":
{
  "analysis": [
    { "word": "今日", "pos": "명사", "reading": "きょう", "meaning": "오늘" },
    { "word": "は", "pos": "조사", "reading": "は", "meaning": "주제를 나타내는 조사" },
    { "word": "晴れ", "pos": "명사", "reading": "はれ", "meaning": "맑음, 화창함" },
    { "word": "です", "pos": "조동사", "reading": "です", "meaning": "정중한 단정의 표현 (~입니다)" }
  ]
}"#;

pub const TRANSLATE_SYSTEM: &str = r#"You are a Korean to Japanese translator. Translate the given Korean text into natural, fluent Japanese.

Rules:
- Translate Korean text to natural Japanese
- Maintain the original meaning and nuance
- Use appropriate Japanese grammar and expressions
- Return ONLY the translated Japanese text, no explanation, no markdown
- Do not include any additional formatting or commentary"#;

pub fn annotate_user(text: &str) -> String {
    format!("Convert this Japanese sentence: \"{text}\"")
}

pub fn analyze_user(text: &str) -> String {
    format!("Analyze this Japanese sentence: \"{text}\"")
}

pub fn translate_user(text: &str) -> String {
    format!("Translate this Korean text to Japanese: \"{text}\"")
}
