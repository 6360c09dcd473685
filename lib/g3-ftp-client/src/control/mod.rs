/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};

use g3_text_proto::reply::{Reply, ReplyListener, ReplyReader, ReplySyntax};

use crate::FtpControlConfig;
use crate::connection::FtpDataAddr;
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpFileRetrieveStartError, FtpFileStoreStartError,
    FtpRawResponseError, FtpTransferServerError,
};
use crate::transfer::FtpTransferType;

mod response;

mod command;
pub use command::FtpCommand;

/// The control connection, driven one command / reply exchange at a time.
pub(crate) struct FtpControlChannel<T> {
    config: FtpControlConfig,
    reader: ReplyReader<BufStream<T>>,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        let reader = ReplyReader::new(
            BufStream::new(stream),
            ReplySyntax::FTP,
            config.reply_reader_config(),
        );
        FtpControlChannel { config, reader }
    }

    #[inline]
    pub(crate) fn last_reply(&self) -> Option<&Reply> {
        self.reader.last_reply()
    }

    #[inline]
    pub(crate) fn add_listener(&mut self, listener: Arc<dyn ReplyListener>) {
        self.reader.add_listener(listener);
    }

    #[inline]
    pub(crate) fn remove_listener(&mut self, listener: &Arc<dyn ReplyListener>) {
        self.reader.remove_listener(listener);
    }

    pub(crate) async fn shutdown(&mut self) -> std::io::Result<()> {
        self.reader.get_mut().shutdown().await
    }

    pub(crate) async fn read_raw_response(&mut self) -> Result<Reply, FtpRawResponseError> {
        Ok(self.reader.read_reply().await?)
    }

    pub(crate) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<Reply, FtpRawResponseError> {
        self.timed_read_raw_response_with(self.config.command_timeout, stage)
            .await
    }

    async fn timed_read_raw_response_with(
        &mut self,
        timeout: Duration,
        stage: &'static str,
    ) -> Result<Reply, FtpRawResponseError> {
        match tokio::time::timeout(timeout, self.read_raw_response()).await {
            Ok(r) => r,
            Err(_) => Err(FtpRawResponseError::ReadResponseTimedOut(stage)),
        }
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code().as_u16() {
                120 => continue,
                220 => Ok(()),
                n => Err(FtpCommandError::UnexpectedReplyCode(
                    FtpCommand::GREETING,
                    n,
                )),
            };
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        let username = name.unwrap_or("anonymous");
        self.send_cmd1(cmd, username)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send username").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        let password = pass.unwrap_or("xxx");
        self.send_cmd1(cmd, password)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send password").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 => Err(FtpCommandError::CommandNotImplemented(cmd)), // not fatal but unexpected
            230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_account(
        &mut self,
        account: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::ACCT;
        self.send_cmd1(cmd, account)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send account").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send quit").await?;
        match reply.code().as_u16() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            221 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_pasv_port(&mut self) -> Result<FtpDataAddr, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("request pasv port").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            227 => match response::parse_pasv_227_reply(&reply) {
                Some(addr) => Ok(FtpDataAddr::Socket(addr)),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_epsv_port(&mut self) -> Result<FtpDataAddr, FtpCommandError> {
        let cmd = FtpCommand::EPSV;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("request epsv port").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 | 522 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            229 => match response::parse_epsv_229_reply(&reply) {
                Some(port) => Ok(FtpDataAddr::Port(port)),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 229)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn abort_transfer(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::ABOR;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("abort transfer").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            225 | 226 => Ok(()),
            426 => {
                let reply = self.timed_read_raw_response("wait abort transfer").await?;
                match reply.code().as_u16() {
                    225 | 226 => Ok(()),
                    n => {
                        // use 1xxx to represent the second one of reply code
                        Err(FtpCommandError::UnexpectedReplyCode(cmd, 1000 + n))
                    }
                }
            }
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Image => FtpCommand::TYPE_I,
        };
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("request transfer type")
            .await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_restart(&mut self, position: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REST;
        self.send_cmd1(cmd, &position.to_string())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("request restart").await?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            350 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    /// Send one of LIST / NLST / MLSD and wait for the preliminary reply.
    pub(crate) async fn start_list(
        &mut self,
        cmd: FtpCommand,
        path: Option<&str>,
    ) -> Result<(), FtpFileRetrieveStartError> {
        let r = match path {
            Some(path) => self.send_cmd1(cmd, path).await,
            None => self.send_cmd(cmd).await,
        };
        r.map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start list")
            .await
            .map_err(FtpCommandError::from)?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            125 | 150 => Ok(()),
            450 | 550 => Err(FtpFileRetrieveStartError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn start_retrieve(
        &mut self,
        path: &str,
    ) -> Result<(), FtpFileRetrieveStartError> {
        let cmd = FtpCommand::RETR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start retrieve")
            .await
            .map_err(FtpCommandError::from)?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            125 | 150 => Ok(()),
            450 | 550 => Err(FtpFileRetrieveStartError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn start_store(&mut self, path: &str) -> Result<(), FtpFileStoreStartError> {
        let cmd = FtpCommand::STOR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start store")
            .await
            .map_err(FtpCommandError::from)?;
        match reply.code().as_u16() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            532 => Err(FtpFileStoreStartError::NeedAccountForStoring),
            553 => Err(FtpFileStoreStartError::FileNameNotAllowed),
            125 | 150 => Ok(()),
            450 | 550 => Err(FtpFileStoreStartError::FileUnavailable),
            452 => Err(FtpFileStoreStartError::InsufficientStorageSpace),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Wait for the reply that ends the data transfer started by `cmd`.
    pub(crate) async fn wait_transfer_end(
        &mut self,
        cmd: FtpCommand,
        timeout: Duration,
    ) -> Result<(), FtpTransferServerError> {
        let reply = self
            .timed_read_raw_response_with(timeout, "wait transfer end")
            .await?;
        match reply.code().as_u16() {
            110 => Err(FtpTransferServerError::RestartNeeded),
            226 | 250 => Ok(()),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            551 => Err(FtpTransferServerError::PageTypeUnknown),
            552 => Err(FtpTransferServerError::ExceededStorageAllocation),
            n => Err(FtpTransferServerError::UnexpectedEndReplyCode(cmd, n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn greeting_and_login() {
        let stream = Builder::new()
            .read(b"120 wait a moment\r\n")
            .read(b"220-welcome\r\n220 ready\r\n")
            .write(b"USER anonymous\r\n")
            .read(b"331 password needed\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230 logged in\r\n")
            .build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());
        control.wait_greetings().await.unwrap();
        assert_eq!(control.last_reply().unwrap().lines().len(), 2);

        let status = control.send_username(None).await.unwrap();
        assert_eq!(status, FtpAuthStatus::NeedPassword);
        let status = control.send_password(Some("secret")).await.unwrap();
        assert_eq!(status, FtpAuthStatus::LoggedIn);
    }

    #[tokio::test]
    async fn service_not_available() {
        let stream = Builder::new()
            .read(b"421 too many users\r\n")
            .build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());
        let e = control.wait_greetings().await.unwrap_err();
        assert!(matches!(e, FtpCommandError::ServiceNotAvailable));
        assert_eq!(control.last_reply().unwrap().code().as_u16(), 421);
    }

    #[tokio::test]
    async fn passive_address() {
        let stream = Builder::new()
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,1)\r\n")
            .write(b"EPSV\r\n")
            .read(b"229 Entering Extended Passive Mode (|||2121|)\r\n")
            .write(b"EPSV\r\n")
            .read(b"522 not supported\r\n")
            .build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());

        let addr = control.request_pasv_port().await.unwrap();
        assert_eq!(addr, FtpDataAddr::Socket("127.0.0.1:1025".parse().unwrap()));
        let addr = control.request_epsv_port().await.unwrap();
        assert_eq!(addr, FtpDataAddr::Port(2121));
        let e = control.request_epsv_port().await.unwrap_err();
        assert!(matches!(e, FtpCommandError::CommandNotImplemented(FtpCommand::EPSV)));
    }

    #[tokio::test]
    async fn abort_with_lost_transfer() {
        let stream = Builder::new()
            .write(b"ABOR\r\n")
            .read(b"426 transfer aborted\r\n")
            .read(b"226 abort successful\r\n")
            .build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());
        control.abort_transfer().await.unwrap();
    }

    #[tokio::test]
    async fn transfer_end() {
        let stream = Builder::new()
            .read(b"226 Transfer complete\r\n")
            .read(b"426 Connection closed; transfer aborted\r\n")
            .read(b"299 what\r\n")
            .build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());
        let timeout = Duration::from_secs(1);
        control
            .wait_transfer_end(FtpCommand::RETR, timeout)
            .await
            .unwrap();
        let e = control
            .wait_transfer_end(FtpCommand::RETR, timeout)
            .await
            .unwrap_err();
        assert!(matches!(e, FtpTransferServerError::DataTransferLost));
        let e = control
            .wait_transfer_end(FtpCommand::STOR, timeout)
            .await
            .unwrap_err();
        assert!(matches!(
            e,
            FtpTransferServerError::UnexpectedEndReplyCode(FtpCommand::STOR, 299)
        ));
    }

    #[tokio::test]
    async fn reject_line_break_in_parameter() {
        let stream = Builder::new().build();
        let mut control = FtpControlChannel::new(stream, FtpControlConfig::default());
        let e = control.send_username(Some("a\r\nDELE b")).await.unwrap_err();
        assert!(matches!(e, FtpCommandError::SendFailed(_)));
    }
}
