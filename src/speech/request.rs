//! Gemini `generateContent` wire format for speech synthesis.
//!
//! Only the handful of fields the fetcher needs are touched, so the request
//! is built with `serde_json::json!` and the response is walked as a
//! `serde_json::Value` rather than mirrored in full structs.
//!
//! ```text
//! request:  contents[0].parts[0].text = "Say the word: <word>"
//!           generationConfig.responseModalities = ["AUDIO"]
//!           generationConfig.speechConfig.voiceConfig.prebuiltVoiceConfig.voiceName
//! response: candidates[0].content.parts[*].inlineData.data  (base64 PCM)
//! ```

use serde_json::Value;

/// Placeholder replaced by the word in the prompt template.
pub const WORD_PLACEHOLDER: &str = "{word}";

/// Render the prompt for `word`.
///
/// A template without the placeholder gets the word appended after a space.
///
/// ```
/// use word_sound::speech::build_prompt;
///
/// assert_eq!(build_prompt("Say the word: {word}", "cat"), "Say the word: cat");
/// assert_eq!(build_prompt("Pronounce", "cat"), "Pronounce cat");
/// ```
pub fn build_prompt(template: &str, word: &str) -> String {
    if template.contains(WORD_PLACEHOLDER) {
        template.replace(WORD_PLACEHOLDER, word)
    } else {
        format!("{} {}", template.trim_end(), word)
    }
}

/// JSON body requesting an audio-only response spoken by `voice`.
pub fn build_request_body(prompt: &str, voice: &str) -> Value {
    serde_json::json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice }
                }
            }
        }
    })
}

/// The base64 payload of the first inline-data part of the first candidate.
pub fn extract_inline_audio(response: &Value) -> Option<&str> {
    response["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .find_map(|part| part["inlineData"]["data"].as_str())
        .filter(|data| !data.is_empty())
}

/// `error.message` of a Google API error body, if present.
pub fn service_error_message(response: &Value) -> Option<&str> {
    response["error"]["message"].as_str()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_substitutes_every_placeholder() {
        assert_eq!(build_prompt("{word}, {word}!", "go"), "go, go!");
    }

    #[test]
    fn body_requests_audio_with_voice() {
        let body = build_request_body("Say the word: cat", "Kore");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Say the word: cat");
        assert_eq!(body["generationConfig"]["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
    }

    #[test]
    fn extracts_first_inline_part() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AEAAwA==" } },
                    { "inlineData": { "data": "second" } }
                ]}
            }]
        });
        assert_eq!(extract_inline_audio(&response), Some("AEAAwA=="));
    }

    #[test]
    fn text_only_response_has_no_audio() {
        let response = json!({
            "candidates": [{ "content": { "parts": [ { "text": "sorry" } ] } }]
        });
        assert_eq!(extract_inline_audio(&response), None);
    }

    #[test]
    fn empty_or_missing_candidates_have_no_audio() {
        assert_eq!(extract_inline_audio(&json!({})), None);
        assert_eq!(extract_inline_audio(&json!({ "candidates": [] })), None);
        let empty_data = json!({
            "candidates": [{ "content": { "parts": [ { "inlineData": { "data": "" } } ] } }]
        });
        assert_eq!(extract_inline_audio(&empty_data), None);
    }

    #[test]
    fn reads_google_error_message() {
        let body = json!({ "error": { "code": 400, "message": "API key not valid" } });
        assert_eq!(service_error_message(&body), Some("API key not valid"));
        assert_eq!(service_error_message(&json!({})), None);
    }
}
