use crate::batch::{Artifact, ArtifactName, InputFile};
use crate::converter::{has_extension, run_tool, ConverterError};
use bytes::Bytes;
use std::path::Path;

const TOOL: &str = "ffmpeg";

pub const MOV_TO_MP4_FOLDER: &str = "mov-to-mp4";
pub const MP4_TO_MP3_FOLDER: &str = "audio";

/// Audio/video transcoding through FFmpeg
#[derive(Debug, Clone)]
pub struct MediaTranscoder {
    ffmpeg_path: String,
}

impl MediaTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// H.264 video with 192k AAC audio
    #[tracing::instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn mov_to_mp4(&self, input: &InputFile) -> Result<Artifact, ConverterError> {
        require_extension(input, "mov", "MOV")?;

        let output = self
            .transcode(
                input,
                "mov",
                "mp4",
                &[
                    "-c:v", "libx264", "-preset", "fast", "-crf", "23", "-c:a", "aac", "-b:a",
                    "192k",
                ],
            )
            .await?;

        Ok(Artifact::new(
            output,
            ArtifactName::unique("", "mp4"),
            "video/mp4",
        ))
    }

    /// Audio track only, MP3. The output keeps the upload's file stem.
    #[tracing::instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn mp4_to_mp3(&self, input: &InputFile) -> Result<Artifact, ConverterError> {
        require_extension(input, "mp4", "MP4")?;

        let output = self
            .transcode(input, "mp4", "mp3", &["-map", "a", "-acodec", "libmp3lame", "-y"])
            .await?;

        let stem = Path::new(&input.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        Ok(Artifact::new(
            output,
            ArtifactName::derived(stem, "mp3"),
            "audio/mpeg",
        ))
    }

    async fn transcode(
        &self,
        input: &InputFile,
        input_ext: &str,
        output_ext: &str,
        codec_args: &[&str],
    ) -> Result<Bytes, ConverterError> {
        let workdir = tempfile::tempdir()?;
        let source = workdir.path().join(format!("input.{}", input_ext));
        let target = workdir.path().join(format!("output.{}", output_ext));
        tokio::fs::write(&source, &input.data).await?;

        let mut args = vec!["-i".to_string(), source.to_string_lossy().to_string()];
        args.extend(codec_args.iter().map(|a| a.to_string()));
        args.push(target.to_string_lossy().to_string());

        run_tool(TOOL, &self.ffmpeg_path, &args).await?;

        let data = match tokio::fs::read(&target).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::MissingOutput { tool: TOOL });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(bytes = data.len(), output = output_ext, "Transcoded media");
        Ok(Bytes::from(data))
    }
}

fn require_extension(
    input: &InputFile,
    extension: &str,
    label: &'static str,
) -> Result<(), ConverterError> {
    if has_extension(&input.filename, &[extension]) {
        Ok(())
    } else {
        Err(ConverterError::UnsupportedExtension {
            expected: label,
            filename: input.filename.clone(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::converter::fake_tool;

    /// Writes its arguments into the output file (the last argument)
    const ECHO_ARGS: &str = r#"for last; do :; done
echo "$@" > "$last""#;

    fn upload(name: &str) -> InputFile {
        InputFile::new(name, Bytes::from_static(b"\x00\x00\x00\x18ftypisom"))
    }

    #[tokio::test]
    async fn test_mov_to_mp4_arguments() {
        let bin = tempfile::tempdir().unwrap();
        let ffmpeg = fake_tool::install(bin.path(), "ffmpeg", ECHO_ARGS);

        let artifact = MediaTranscoder::new(ffmpeg.to_string_lossy())
            .mov_to_mp4(&upload("clip.MOV"))
            .await
            .unwrap();

        let args = String::from_utf8(artifact.data.to_vec()).unwrap();
        assert!(args.contains("-c:v libx264 -preset fast -crf 23 -c:a aac -b:a 192k"));
        assert_eq!(artifact.content_type, "video/mp4");
        assert!(artifact.name.render().ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_mp4_to_mp3_keeps_stem() {
        let bin = tempfile::tempdir().unwrap();
        let ffmpeg = fake_tool::install(bin.path(), "ffmpeg", ECHO_ARGS);

        let artifact = MediaTranscoder::new(ffmpeg.to_string_lossy())
            .mp4_to_mp3(&upload("holiday.mp4"))
            .await
            .unwrap();

        let args = String::from_utf8(artifact.data.to_vec()).unwrap();
        assert!(args.contains("-map a -acodec libmp3lame -y"));
        assert_eq!(artifact.content_type, "audio/mpeg");
        let name = artifact.name.render();
        assert!(name.starts_with("holiday_"), "{}", name);
        assert!(name.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn test_wrong_extension() {
        let transcoder = MediaTranscoder::new("ffmpeg");
        assert!(transcoder.mov_to_mp4(&upload("clip.mp4")).await.unwrap_err().is_client_error());
        assert!(transcoder.mp4_to_mp3(&upload("clip.mov")).await.unwrap_err().is_client_error());
    }

    #[tokio::test]
    async fn test_ffmpeg_error_output() {
        let bin = tempfile::tempdir().unwrap();
        let ffmpeg =
            fake_tool::install(bin.path(), "ffmpeg", "echo 'Invalid data found' >&2\nexit 1");

        let err = MediaTranscoder::new(ffmpeg.to_string_lossy())
            .mp4_to_mp3(&upload("a.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "ffmpeg failed: Invalid data found");
    }
}
