//! OpenAI provider configuration types.

use std::str::FromStr;

/// Default base URL for the OpenAI REST API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Container format of inbound audio chunks.
///
/// The transcription endpoint infers the codec from the uploaded filename,
/// so the only thing this controls is the filename hint and MIME type of
/// the multipart file part. Browser `MediaRecorder` capture is WebM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioInputFormat {
    /// WebM container (Opus audio), the browser capture default
    #[default]
    Webm,
    /// WAV / RIFF
    Wav,
    /// Ogg container
    Ogg,
    /// MP3
    Mp3,
}

impl AudioInputFormat {
    /// File extension used in the multipart filename hint.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioInputFormat::Webm => "webm",
            AudioInputFormat::Wav => "wav",
            AudioInputFormat::Ogg => "ogg",
            AudioInputFormat::Mp3 => "mp3",
        }
    }

    /// MIME type for the multipart file part.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioInputFormat::Webm => "audio/webm",
            AudioInputFormat::Wav => "audio/wav",
            AudioInputFormat::Ogg => "audio/ogg",
            AudioInputFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl FromStr for AudioInputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webm" => Ok(AudioInputFormat::Webm),
            "wav" => Ok(AudioInputFormat::Wav),
            "ogg" => Ok(AudioInputFormat::Ogg),
            "mp3" => Ok(AudioInputFormat::Mp3),
            other => Err(format!(
                "Unsupported audio input format: {other}. Supported formats: webm, wav, ogg, mp3"
            )),
        }
    }
}

impl std::fmt::Display for AudioInputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
