//! Core `PronunciationFetcher` trait and `GeminiFetcher` implementation.
//!
//! `GeminiFetcher` calls the Gemini `models/{model}:generateContent`
//! endpoint with an audio response modality and decodes the returned PCM.
//! Connection details come from [`SpeechConfig`]; the key comes from an
//! [`ApiCredential`] read once at start-up.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::audio::{decode_pcm16, DecodeError, PcmBuffer};
use crate::config::{ApiCredential, AudioConfig, SpeechConfig};
use crate::speech::request::{
    build_prompt, build_request_body, extract_inline_audio, service_error_message,
};

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching a pronunciation.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No API key was configured at start-up.
    #[error("API key is missing")]
    MissingCredential,

    /// The service answered but the response carried no audio.
    #[error("no audio data received from the speech service")]
    NoAudioReturned,

    /// Transport, HTTP status or response-format failure.
    #[error("speech request failed: {0}")]
    FetchFailed(String),

    /// The audio payload could not be decoded.
    #[error(transparent)]
    MalformedAudio(#[from] DecodeError),
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::FetchFailed("request timed out".into())
        } else {
            SpeechError::FetchFailed(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// PronunciationFetcher trait
// ---------------------------------------------------------------------------

/// Async source of spoken pronunciations.
///
/// Implementors must be `Send + Sync` so they can be shared with the tokio
/// tasks spawned per click (`Arc<dyn PronunciationFetcher>`).
#[async_trait]
pub trait PronunciationFetcher: Send + Sync {
    /// Synthesise `word` and return the decoded audio.
    async fn fetch(&self, word: &str) -> Result<PcmBuffer, SpeechError>;
}

// ---------------------------------------------------------------------------
// GeminiFetcher
// ---------------------------------------------------------------------------

/// Fetches pronunciations from the Gemini TTS API.
pub struct GeminiFetcher {
    client: reqwest::Client,
    config: SpeechConfig,
    audio: AudioConfig,
    credential: ApiCredential,
}

impl GeminiFetcher {
    /// Build a fetcher from application config.
    ///
    /// The HTTP client gets a timeout only when `speech.timeout_secs` is set.
    pub fn new(speech: &SpeechConfig, audio: &AudioConfig, credential: ApiCredential) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = speech.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        if !credential.is_present() {
            log::warn!(
                "no API key found in ${}; every pronunciation request will fail",
                speech.api_key_env
            );
        }

        Self {
            client,
            config: speech.clone(),
            audio: audio.clone(),
            credential,
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl PronunciationFetcher for GeminiFetcher {
    async fn fetch(&self, word: &str) -> Result<PcmBuffer, SpeechError> {
        let key = self.credential.key().ok_or(SpeechError::MissingCredential)?;

        let prompt = build_prompt(&self.config.prompt_template, word);
        let body = build_request_body(&prompt, &self.config.voice);

        log::debug!("speech: requesting {:?} from {}", word, self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let json: Option<serde_json::Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = json
                .as_ref()
                .and_then(service_error_message)
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(SpeechError::FetchFailed(format!(
                "HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        let json = json.ok_or_else(|| {
            SpeechError::FetchFailed("response body is not valid JSON".into())
        })?;

        let encoded = extract_inline_audio(&json).ok_or(SpeechError::NoAudioReturned)?;
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| SpeechError::FetchFailed(format!("invalid base64 audio: {e}")))?;

        let buffer = decode_pcm16(&bytes, self.audio.sample_rate, self.audio.channels)?;
        log::debug!(
            "speech: {:?} → {} frames @ {} Hz",
            word,
            buffer.frames(),
            buffer.sample_rate()
        );
        Ok(buffer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response on a local port and hand back the raw
    /// request that was received.
    ///
    /// The server accepts a single connection, reads until the headers and
    /// `Content-Length` bytes of body have arrived, answers with
    /// `status_line` and a JSON `body`, then closes.  Chunked request bodies
    /// are not understood; reqwest sends `.json()` bodies with a length.
    async fn serve_once(
        status_line: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (base_url, handle)
    }

    fn fetcher_for(base_url: &str, credential: ApiCredential) -> GeminiFetcher {
        let speech = SpeechConfig {
            base_url: base_url.into(),
            timeout_secs: Some(5),
            ..SpeechConfig::default()
        };
        GeminiFetcher::new(&speech, &AudioConfig::default(), credential)
    }

    fn audio_response(base64: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": base64 } } ] }
            }]
        })
        .to_string()
    }

    #[test]
    fn endpoint_includes_model() {
        let fetcher = fetcher_for("https://example.test/", ApiCredential::missing());
        assert_eq!(
            fetcher.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        // Port 9 (discard) is never contacted: the key check comes first.
        let fetcher = fetcher_for("http://127.0.0.1:9", ApiCredential::missing());
        let err = fetcher.fetch("cat").await.unwrap_err();
        assert!(matches!(err, SpeechError::MissingCredential));
    }

    #[tokio::test]
    async fn decodes_inline_audio() {
        // [0x00,0x40,0x00,0xC0] → 0.5, -0.5
        let (base_url, server) = serve_once("200 OK", audio_response("AEAAwA==")).await;
        let fetcher = fetcher_for(&base_url, ApiCredential::new("test-key"));

        let buffer = fetcher.fetch("cat").await.unwrap();
        assert_eq!(buffer.sample_rate(), 24_000);
        assert_eq!(buffer.frames(), 2);
        assert!((buffer.channel(0)[0] - 0.5).abs() < 1e-6);
        assert!((buffer.channel(0)[1] + 0.5).abs() < 1e-6);

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "POST /v1beta/models/gemini-2.5-flash-preview-tts:generateContent"
        ));
        assert!(request.to_ascii_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("Say the word: cat"));
        assert!(request.contains("\"AUDIO\""));
        assert!(request.contains("Kore"));
    }

    #[tokio::test]
    async fn response_without_audio_is_reported() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [ { "text": "no" } ] } }]
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;
        let fetcher = fetcher_for(&base_url, ApiCredential::new("k"));

        let err = fetcher.fetch("cat").await.unwrap_err();
        assert!(matches!(err, SpeechError::NoAudioReturned));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_error_carries_service_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#.to_string();
        let (base_url, server) = serve_once("400 Bad Request", body).await;
        let fetcher = fetcher_for(&base_url, ApiCredential::new("bad"));

        match fetcher.fetch("cat").await.unwrap_err() {
            SpeechError::FetchFailed(msg) => {
                assert!(msg.contains("400"), "{msg}");
                assert!(msg.contains("API key not valid"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn odd_length_payload_is_malformed() {
        // "AEAA" → 3 bytes
        let (base_url, server) = serve_once("200 OK", audio_response("AEAA")).await;
        let fetcher = fetcher_for(&base_url, ApiCredential::new("k"));

        let err = fetcher.fetch("cat").await.unwrap_err();
        assert!(matches!(
            err,
            SpeechError::MalformedAudio(DecodeError::MalformedAudio { byte_len: 3, .. })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_base64_is_a_fetch_failure() {
        let (base_url, server) = serve_once("200 OK", audio_response("@@not base64@@")).await;
        let fetcher = fetcher_for(&base_url, ApiCredential::new("k"));

        let err = fetcher.fetch("cat").await.unwrap_err();
        assert!(matches!(err, SpeechError::FetchFailed(_)));
        server.await.unwrap();
    }

    #[test]
    fn fetcher_is_object_safe() {
        let fetcher: Box<dyn PronunciationFetcher> =
            Box::new(fetcher_for("http://localhost", ApiCredential::missing()));
        drop(fetcher);
    }
}
