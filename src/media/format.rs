use crate::error::RecorderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Container formats the requesters know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Webm,
    Mp4,
}

impl MediaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Webm => "webm",
            MediaFormat::Mp4 => "mp4",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaFormat::Webm => "video/webm",
            MediaFormat::Mp4 => "video/mp4",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "video/webm" => Some(MediaFormat::Webm),
            "video/mp4" => Some(MediaFormat::Mp4),
            _ => None,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MediaFormat {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webm" => Ok(MediaFormat::Webm),
            "mp4" => Ok(MediaFormat::Mp4),
            other => Err(RecorderError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_strings() {
        assert_eq!("webm".parse::<MediaFormat>().unwrap(), MediaFormat::Webm);
        assert_eq!(" MP4 ".parse::<MediaFormat>().unwrap(), MediaFormat::Mp4);
        assert_eq!(
            "gif".parse::<MediaFormat>(),
            Err(RecorderError::UnsupportedFormat("gif".to_string()))
        );
    }

    #[test]
    fn test_mime_round_trip() {
        for format in [MediaFormat::Webm, MediaFormat::Mp4] {
            assert_eq!(MediaFormat::from_mime(format.mime()), Some(format));
        }
    }
}
