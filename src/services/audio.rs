use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::{thread_rng, Rng};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};

use std::{thread, time::Duration};

/// Vozes conhecidas do endpoint de fala do site hospedeiro.
pub const VOICES: [&str; 11] = [
    "alloy", "ash", "ballad", "coral", "echo", "fable", "onyx", "nova", "sage", "shimmer", "verse",
];

pub const DEFAULT_VOICE: &str = "sage";

const MAX_RETRIES: usize = 3;
const BASE_DELAY_MS: u64 = 500;
const TIMEOUT_SECS: u64 = 30;

// Parâmetros PCM assumidos para a saída crua do endpoint.
const SAMPLE_RATE: u32 = 24_000;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

#[derive(Debug, Clone)]
pub struct AudioAttachment {
    /// Payload em base64, pronto para anexar na nota.
    pub data: String,
    pub filename: String,
}

pub fn normalize_voice(requested: Option<&str>) -> String {
    if let Some(v) = requested {
        let v = v.trim().to_lowercase();
        if VOICES.contains(&v.as_str()) {
            return v;
        }
    }
    DEFAULT_VOICE.to_string()
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Busca a pronúncia sintetizada e devolve (payload base64, mime).
/// Falha total vira None: ausência de áudio nunca aborta o save.
pub fn fetch_speech(
    origin: &str,
    text: &str,
    language: &str,
    voice: &str,
) -> Option<(String, String)> {
    let client = match Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[audio] failed to build http client: {e}");
            return None;
        }
    };

    let url = format!("{}/api/speech", origin.trim_end_matches('/'));

    for attempt in 0..MAX_RETRIES {
        let res = client
            .get(&url)
            .query(&[
                ("text", text),
                ("language", language),
                ("voice", voice),
                ("raw", "true"),
            ])
            .send();

        match res {
            Ok(resp) => {
                let status = resp.status();

                if !status.is_success() {
                    eprintln!("[audio] speech endpoint returned HTTP {}", status.as_u16());
                    if should_retry_http(status) && attempt + 1 < MAX_RETRIES {
                        thread::sleep(backoff(attempt));
                        continue;
                    }
                    return None;
                }

                let mime = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                let bytes = match resp.bytes() {
                    Ok(b) => b.to_vec(),
                    Err(e) => {
                        eprintln!("[audio] failed to read speech body: {e}");
                        if attempt + 1 < MAX_RETRIES {
                            thread::sleep(backoff(attempt));
                            continue;
                        }
                        return None;
                    }
                };

                if bytes.is_empty() {
                    return None;
                }

                // PCM cru precisa de header WAV antes de virar arquivo tocável.
                let (payload, mime) = if mime.contains("audio/pcm") || mime.contains("audio/x-pcm")
                {
                    (wav_from_pcm(&bytes), "audio/wav".to_string())
                } else {
                    (bytes, mime)
                };

                return Some((BASE64.encode(&payload), mime));
            }
            Err(e) => {
                eprintln!("[audio] speech request failed: {e}");
                if attempt + 1 < MAX_RETRIES {
                    thread::sleep(backoff(attempt));
                    continue;
                }
            }
        }
    }

    None
}

/// Monta um container WAV mínimo (RIFF) na frente dos bytes PCM:
/// header de 44 bytes, mono, 16-bit, 24kHz.
pub fn wav_from_pcm(pcm: &[u8]) -> Vec<u8> {
    let byte_rate = SAMPLE_RATE * CHANNELS as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    let data_size = pcm.len() as u32;
    let file_size = 44 + data_size;

    let mut out = Vec::with_capacity(file_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(file_size - 8).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // tamanho do chunk fmt
    out.extend_from_slice(&1u16.to_le_bytes()); // formato 1 = PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}

/// Nome determinístico por texto: re-salvar a mesma tradução reaproveita o
/// mesmo arquivo de mídia em vez de acumular cópias.
pub fn audio_filename(text: &str, source_lang: &str, target_lang: &str, mime: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "kotoba_{}_{}_{}.{}",
        source_lang,
        target_lang,
        &digest[..8],
        extension_for(mime)
    )
}

fn extension_for(mime: &str) -> &'static str {
    if mime.contains("wav") || mime.contains("pcm") {
        "wav"
    } else if mime.contains("ogg") {
        "ogg"
    } else if mime.contains("webm") {
        "webm"
    } else {
        "mp3"
    }
}
