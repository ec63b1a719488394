//! Argument list for a single video + audio merge.

use std::ffi::OsString;
use std::path::PathBuf;

/// Describes one merge invocation.
///
/// Video stream 0 of the first input and audio stream 0 of the second input
/// are mapped into `output`. The video codec defaults to `copy` so the picture
/// is never re-encoded.
#[derive(Debug, Clone)]
pub struct MergeCommand {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    /// Stop at the end of the shorter input.
    pub shortest: bool,
}

impl MergeCommand {
    pub fn new(video: PathBuf, audio: PathBuf, output: PathBuf) -> Self {
        Self {
            video,
            audio,
            output,
            video_codec: "copy".to_string(),
            audio_codec: "aac".to_string(),
            shortest: true,
        }
    }

    /// Build the argument vector, excluding the program itself.
    ///
    /// Progress goes to stdout as `key=value` blocks and stderr carries only
    /// diagnostics. `-y` is always passed because the output path is a fresh
    /// staging file; the overwrite policy is enforced when it is moved into
    /// place.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-y", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(self.video.clone().into());
        args.push("-i".into());
        args.push(self.audio.clone().into());
        args.extend(
            [
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                self.video_codec.as_str(),
                "-c:a",
                self.audio_codec.as_str(),
            ]
            .iter()
            .map(OsString::from),
        );
        if self.shortest {
            args.push("-shortest".into());
        }
        args.extend(["-progress", "pipe:1", "-nostats"].iter().map(OsString::from));
        args.push(self.output.clone().into());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_default_args() {
        let cmd = MergeCommand::new(
            PathBuf::from("/in/a.mp4"),
            PathBuf::from("/in/a.m4a"),
            PathBuf::from("/out/.a_merged.tmp.mp4"),
        );
        let args = as_strings(&cmd.to_args());

        assert_eq!(&args[..5], ["-hide_banner", "-nostdin", "-y", "-i", "/in/a.mp4"]);
        assert!(args.windows(2).any(|w| w == ["-map", "0:v:0"]));
        assert!(args.windows(2).any(|w| w == ["-map", "1:a:0"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.windows(2).any(|w| w == ["-progress", "pipe:1"]));
        assert_eq!(args.last().unwrap(), "/out/.a_merged.tmp.mp4");
    }

    #[test]
    fn test_custom_codecs_without_shortest() {
        let mut cmd = MergeCommand::new("v.mkv".into(), "a.flac".into(), "o.mkv".into());
        cmd.audio_codec = "copy".to_string();
        cmd.shortest = false;
        let args = as_strings(&cmd.to_args());

        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert!(!args.contains(&"-shortest".to_string()));
    }
}
