use super::format::MediaFormat;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Transcoding engine: one encoded clip in, one clip in another container out
#[async_trait::async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: Vec<u8>, from: MediaFormat, to: MediaFormat)
        -> Result<Vec<u8>>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Runs the `ffmpeg` command line in a scratch directory
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    work_dir: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Arguments for one conversion, relative to the scratch directory
    pub fn args(from: MediaFormat, to: MediaFormat) -> Vec<String> {
        let input = format!("input.{}", from.extension());
        let output = format!("output.{}", to.extension());

        let codec_args: &[&str] = match to {
            // Keep the video stream, re-encode audio for MP4 players
            MediaFormat::Mp4 => &["-c:v", "copy", "-c:a", "aac", "-b:a", "192k"],
            MediaFormat::Webm => &["-c:v", "libvpx-vp9", "-c:a", "libopus"],
        };

        let mut args = vec!["-y".to_string(), "-i".to_string(), input];
        args.extend(codec_args.iter().map(|a| a.to_string()));
        args.push(output);
        args
    }
}

#[async_trait::async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: Vec<u8>,
        from: MediaFormat,
        to: MediaFormat,
    ) -> Result<Vec<u8>> {
        let scratch = self.work_dir.join(format!("transcode-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&scratch)
            .await
            .with_context(|| format!("Failed to create {:?}", scratch))?;

        let result = run_in(&self.program, &scratch, input, from, to).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            debug!("Failed to clean up {:?}: {}", scratch, e);
        }

        result
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

async fn run_in(
    program: &Path,
    scratch: &Path,
    input: Vec<u8>,
    from: MediaFormat,
    to: MediaFormat,
) -> Result<Vec<u8>> {
    tokio::fs::write(scratch.join(format!("input.{}", from.extension())), &input)
        .await
        .context("Failed to stage transcode input")?;

    let args = FfmpegTranscoder::args(from, to);
    info!("Running {:?} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(&args)
        .current_dir(scratch)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to launch {:?}", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
        bail!(
            "{:?} exited with {}: {}",
            program,
            output.status,
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        );
    }

    tokio::fs::read(scratch.join(format!("output.{}", to.extension())))
        .await
        .context("Failed to read transcode output")
}
