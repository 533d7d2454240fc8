#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp3,
    Wav,
}

impl Container {
    /// Guesses the container from magic bytes. Unknown data is assumed to be
    /// MP3, which is what the voice service returns for `audio/mpeg`.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            Container::Wav
        } else {
            Container::Mp3
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp3 => "mp3",
            Container::Wav => "wav",
        }
    }
}
