/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use g3_io_ext::{LimitedBufReadExt, RecvLineError};

use super::{Reply, ReplyListener, ReplyParser, ReplyReadError, ReplySyntax};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyReaderConfig {
    pub max_line_len: usize,
    pub max_lines: usize,
    pub strict: bool,
}

impl Default for ReplyReaderConfig {
    fn default() -> Self {
        ReplyReaderConfig {
            max_line_len: 2048,
            max_lines: 128,
            strict: false,
        }
    }
}

/// Command / reply channel of a reply-coded protocol.
///
/// The reader is meant to be driven by a single owner, one exchange at a time.
pub struct ReplyReader<S> {
    io: S,
    config: ReplyReaderConfig,
    syntax: ReplySyntax,
    parser: ReplyParser,
    line_buf: Vec<u8>,
    last_reply: Option<Reply>,
    listeners: Vec<Arc<dyn ReplyListener>>,
}

impl<S> ReplyReader<S> {
    pub fn new(io: S, syntax: ReplySyntax, config: ReplyReaderConfig) -> Self {
        ReplyReader {
            io,
            config,
            syntax,
            parser: ReplyParser::new(syntax, config.strict),
            line_buf: Vec::with_capacity(config.max_line_len.min(4096)),
            last_reply: None,
            listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn syntax(&self) -> ReplySyntax {
        self.syntax
    }

    #[inline]
    pub fn config(&self) -> &ReplyReaderConfig {
        &self.config
    }

    /// The most recent reply, `None` if nothing has been read yet.
    #[inline]
    pub fn last_reply(&self) -> Option<&Reply> {
        self.last_reply.as_ref()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ReplyListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn ReplyListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    #[inline]
    pub fn get_ref(&self) -> &S {
        &self.io
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.io
    }

    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S> ReplyReader<S>
where
    S: AsyncBufRead + Unpin,
{
    /// Read one complete reply.
    ///
    /// A well formed reply carrying the service closing code is returned as
    /// [`ReplyReadError::ServiceClosing`], and is still kept as the last reply.
    pub async fn read_reply(&mut self) -> Result<Reply, ReplyReadError> {
        self.parser.reset();
        let mut line_count = 0usize;
        let reply = loop {
            self.line_buf.clear();
            match self
                .io
                .limited_read_crlf_line(self.config.max_line_len, &mut self.line_buf)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => return Err(ReplyReadError::ConnectionClosed),
                Err(RecvLineError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(ReplyReadError::ConnectionClosed);
                }
                Err(RecvLineError::IoError(e)) => return Err(ReplyReadError::ReadFailed(e)),
                Err(RecvLineError::LineTooLong) => return Err(ReplyReadError::LineTooLong),
            }

            #[cfg(feature = "log-raw-io")]
            crate::debug::log_rsp(&self.line_buf);

            line_count += 1;
            if line_count > self.config.max_lines {
                return Err(ReplyReadError::TooManyLines);
            }

            match self.parser.feed_line(&self.line_buf) {
                Ok(Some(reply)) => break reply,
                Ok(None) => {}
                Err(error) => {
                    return Err(ReplyReadError::Malformed {
                        line: String::from_utf8_lossy(&self.line_buf).into_owned(),
                        error,
                    });
                }
            }
        };

        for listener in &self.listeners {
            listener.reply_received(&reply);
        }
        self.last_reply = Some(reply.clone());

        if reply.code() == self.syntax.closing_code() {
            return Err(ReplyReadError::ServiceClosing(reply));
        }
        Ok(reply)
    }
}

impl<S> ReplyReader<S>
where
    S: AsyncWrite + Unpin,
{
    /// Send one command line, the CRLF terminator is added here.
    pub async fn send_command(&mut self, command: &str) -> io::Result<()> {
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(command);

        let mut buf = Vec::with_capacity(command.len() + 2);
        buf.extend_from_slice(command.as_bytes());
        buf.extend_from_slice(b"\r\n");
        self.io.write_all(&buf).await?;
        self.io.flush().await?;

        for listener in &self.listeners {
            listener.command_sent(command);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{BufReader, BufStream};
    use tokio_util::io::StreamReader;

    fn reader_for(data: &'static [u8]) -> ReplyReader<impl AsyncBufRead + Unpin> {
        let stream = tokio_stream::iter(vec![io::Result::Ok(data)]);
        ReplyReader::new(
            StreamReader::new(stream),
            ReplySyntax::FTP,
            ReplyReaderConfig::default(),
        )
    }

    #[tokio::test]
    async fn sequential_replies() {
        let mut reader = reader_for(b"220 ready\r\n250-a\r\n250-b\r\n250 c\r\n");
        assert!(reader.last_reply().is_none());

        let reply = reader.read_reply().await.unwrap();
        assert_eq!(reply.code().as_u16(), 220);
        assert_eq!(reply.lines().len(), 1);

        let reply = reader.read_reply().await.unwrap();
        assert_eq!(reply.code().as_u16(), 250);
        assert_eq!(reply.lines(), &["250-a", "250-b", "250 c"]);
        assert_eq!(reader.last_reply(), Some(&reply));

        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn closed_in_continuation() {
        let mut reader = reader_for(b"250-a\r\n250-b\r\n");
        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn closed_in_final_line() {
        let mut reader = reader_for(b"250-a\r\n250 tru");
        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::ConnectionClosed)));
        assert!(reader.last_reply().is_none());
    }

    #[tokio::test]
    async fn service_closing() {
        let mut reader = reader_for(b"421 Service not available, closing control connection\r\n");
        let e = reader.read_reply().await.unwrap_err();
        assert!(e.is_connection_closed());
        let ReplyReadError::ServiceClosing(reply) = e else {
            panic!("unexpected error");
        };
        assert_eq!(reply.code().as_u16(), 421);
        assert_eq!(reader.last_reply(), Some(&reply));
    }

    #[tokio::test]
    async fn nntp_service_discontinued() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(b"400 service discontinued\r\n".as_slice())]);
        let mut reader = ReplyReader::new(
            StreamReader::new(stream),
            ReplySyntax::NNTP,
            ReplyReaderConfig::default(),
        );
        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::ServiceClosing(_))));
    }

    #[tokio::test]
    async fn malformed() {
        let mut reader = reader_for(b"2x0 bad\r\n");
        let e = reader.read_reply().await.unwrap_err();
        let ReplyReadError::Malformed { line, error } = e else {
            panic!("unexpected error");
        };
        assert_eq!(line, "2x0 bad");
        assert_eq!(error, crate::reply::ReplyLineError::InvalidCode);

        let mut reader = reader_for(b"22\r\n");
        let r = reader.read_reply().await;
        assert!(matches!(
            r,
            Err(ReplyReadError::Malformed {
                error: crate::reply::ReplyLineError::TooShort,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn too_many_lines() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(
            b"211-a\r\n b\r\n c\r\n211 end\r\n".as_slice(),
        )]);
        let config = ReplyReaderConfig {
            max_lines: 3,
            ..Default::default()
        };
        let mut reader = ReplyReader::new(StreamReader::new(stream), ReplySyntax::FTP, config);
        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::TooManyLines)));
    }

    #[tokio::test]
    async fn line_too_long() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(b"220 0123456789\r\n".as_slice())]);
        let config = ReplyReaderConfig {
            max_line_len: 8,
            ..Default::default()
        };
        let mut reader = ReplyReader::new(
            BufReader::with_capacity(4, StreamReader::new(stream)),
            ReplySyntax::FTP,
            config,
        );
        let r = reader.read_reply().await;
        assert!(matches!(r, Err(ReplyReadError::LineTooLong)));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ReplyListener for Recorder {
        fn command_sent(&self, command: &str) {
            self.events.lock().unwrap().push(format!("> {command}"));
        }

        fn reply_received(&self, reply: &Reply) {
            self.events.lock().unwrap().push(format!("< {}", reply.text()));
        }
    }

    #[tokio::test]
    async fn send_and_listen() {
        let mock = tokio_test::io::Builder::new()
            .write(b"NOOP\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut reader = ReplyReader::new(
            BufStream::new(mock),
            ReplySyntax::FTP,
            ReplyReaderConfig::default(),
        );
        let recorder = Arc::new(Recorder::default());
        reader.add_listener(recorder.clone());

        reader.send_command("NOOP").await.unwrap();
        let reply = reader.read_reply().await.unwrap();
        assert_eq!(reply.code().as_u16(), 200);

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.as_slice(), &["> NOOP", "< 200 ok\r\n"]);
    }

    #[tokio::test]
    async fn remove_listener() {
        let mut reader = reader_for(b"200 ok\r\n");
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn ReplyListener> = recorder.clone();
        reader.add_listener(listener.clone());
        reader.remove_listener(&listener);

        reader.read_reply().await.unwrap();
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
