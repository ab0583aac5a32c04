// esu - ElasticSearch Utility for managing an Elasticsearch cluster
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! JSON payloads for `cluster update` and `index create`, read from a file
//! or from piped stdin.

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Read};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How long a non-terminal stdin may stay silent before it counts as absent.
pub const STDIN_GRACE: Duration = Duration::from_millis(250);

pub type Payload = Map<String, Value>;

/// Decodes the first JSON object in the stream. Anything after it is ignored.
pub fn read_payload<R: Read>(reader: R) -> Result<Payload> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<Payload>()
        .next()
        .ok_or_else(|| anyhow!("unexpected end of JSON input"))?
        .context("decoding JSON payload")
}

/// Payload from `path` when given, otherwise from `stdin`. `Ok(None)` means
/// neither supplied anything.
pub fn payload_from<F, R>(path: Option<&Path>, stdin: F) -> Result<Option<Payload>>
where
    F: FnOnce() -> Option<R>,
    R: Read,
{
    match path {
        Some(path) => {
            let file = file_source(path)
                .ok_or_else(|| anyhow!("no such file or directory: {}", path.display()))?;
            read_payload(file).map(Some)
        }
        None => stdin().map(read_payload).transpose(),
    }
}

/// Opens `path` for reading, or `None` if it cannot be opened.
pub fn file_source(path: &Path) -> Option<File> {
    match File::open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "payload file not readable");
            None
        }
    }
}

/// Stdin, but only when something was piped into it. A pipe that nobody
/// writes to within [`STDIN_GRACE`] is treated as no input.
pub fn stdin_source() -> Option<io::StdinLock<'static>> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    if !interactive && !readable_within(&stdin, STDIN_GRACE) {
        debug!("nothing arrived on stdin");
        return None;
    }
    piped_input(interactive, stdin.lock())
}

/// Waits up to `timeout` for `source` to have data or reach end of file.
#[cfg(unix)]
pub fn readable_within<F: std::os::fd::AsFd>(source: &F, timeout: Duration) -> bool {
    use std::os::fd::AsRawFd;

    let mut pollfd = libc::pollfd {
        fd: source.as_fd().as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    // SAFETY: one valid pollfd, borrowed for the duration of the call.
    let ready = unsafe { libc::poll(&mut pollfd, 1, millis) };
    ready > 0 && pollfd.revents & (libc::POLLIN | libc::POLLHUP) != 0
}

#[cfg(not(unix))]
pub fn readable_within<F>(_source: &F, _timeout: Duration) -> bool {
    true
}

/// Returns the reader if it is not attached to a terminal and has at least
/// one byte available.
pub fn piped_input<R: BufRead>(interactive: bool, mut reader: R) -> Option<R> {
    if interactive {
        return None;
    }
    match reader.fill_buf() {
        Ok(buf) if !buf.is_empty() => Some(reader),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn reads_first_object() {
        let payload =
            read_payload(Cursor::new(r#"{"settings": {"number_of_shards": 1}} {"x": 2}"#)).unwrap();
        assert_eq!(payload["settings"]["number_of_shards"], 1);
        assert!(!payload.contains_key("x"));
    }

    #[test]
    fn empty_stream_is_an_error() {
        let err = read_payload(Cursor::new("   ")).unwrap_err();
        assert!(err.to_string().contains("unexpected end of JSON input"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = read_payload(Cursor::new("{\"a\": ")).unwrap_err();
        assert!(err.to_string().contains("decoding JSON payload"));
        assert!(read_payload(Cursor::new("[1, 2]")).is_err());
    }

    #[test]
    fn missing_file_is_none() {
        assert!(file_source(Path::new("/definitely/not/here.json")).is_none());
    }

    #[test]
    fn existing_file_is_readable() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"persistent": {{}}}}"#).unwrap();
        let source = file_source(file.path()).unwrap();
        let payload = read_payload(source).unwrap();
        assert!(payload.contains_key("persistent"));
    }

    #[test]
    fn payload_prefers_path_over_stdin() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"from": "file"}}"#).unwrap();

        let payload = payload_from(Some(file.path()), || Some(Cursor::new(r#"{"from": "stdin"}"#)))
            .unwrap()
            .unwrap();
        assert_eq!(payload["from"], "file");

        let payload = payload_from(None, || Some(Cursor::new(r#"{"from": "stdin"}"#)))
            .unwrap()
            .unwrap();
        assert_eq!(payload["from"], "stdin");

        assert!(payload_from(None, || None::<Cursor<&str>>).unwrap().is_none());
    }

    #[test]
    fn payload_from_missing_path_is_an_error() {
        let err = payload_from(Some(Path::new("/nope.json")), || None::<Cursor<&str>>).unwrap_err();
        assert_eq!(err.to_string(), "no such file or directory: /nope.json");
    }

    #[cfg(unix)]
    #[test]
    fn silent_pipe_is_not_readable() {
        use std::os::unix::net::UnixStream;

        let (mut writer, reader) = UnixStream::pair().unwrap();
        assert!(!readable_within(&reader, Duration::from_millis(20)));

        writer.write_all(br#"{"a": 1}"#).unwrap();
        assert!(readable_within(&reader, Duration::from_millis(20)));
    }

    #[cfg(unix)]
    #[test]
    fn closed_pipe_is_readable_but_empty() {
        use std::io::BufReader;
        use std::os::unix::net::UnixStream;

        let (writer, reader) = UnixStream::pair().unwrap();
        drop(writer);
        assert!(readable_within(&reader, Duration::from_millis(20)));
        assert!(piped_input(false, BufReader::new(reader)).is_none());
    }

    #[test]
    fn piped_input_requires_content() {
        assert!(piped_input(false, Cursor::new(Vec::<u8>::new())).is_none());
        assert!(piped_input(true, Cursor::new(b"{}".to_vec())).is_none());

        let reader = piped_input(false, Cursor::new(b"{\"a\": 1}".to_vec())).unwrap();
        assert_eq!(read_payload(reader).unwrap()["a"], 1);
    }
}
