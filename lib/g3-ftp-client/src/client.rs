/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use g3_io_ext::{StreamCopy, StreamCopyError, StreamCopyProgress};
use g3_text_proto::reply::{Reply, ReplyListener};

use crate::config::{FtpClientConfig, FtpPassiveMode};
use crate::connection::{FtpConnectionProvider, FtpDataAddr};
use crate::control::{FtpCommand, FtpControlChannel};
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpConnectError, FtpDataTransferError, FtpFileListError,
    FtpFileRetrieveStartError, FtpFileStoreStartError, FtpFileTransferError,
    FtpSessionOpenError, FtpTransferSetupError,
};
use crate::list::{FtpEntryParser, FtpListing, MlsxEntryParser};
use crate::log_msg;
use crate::transfer::{FtpLineDataTransfer, FtpTransferType};

/// One FTP session.
///
/// All methods take `&mut self`, so a session drives a single command at a
/// time. While a transfer started by [`FtpClient::start_retrieve`] or
/// [`FtpClient::start_store`] is not yet completed, every other command
/// fails with [`FtpCommandError::TransferPending`].
pub struct FtpClient<CP, S, E, UD>
where
    CP: FtpConnectionProvider<S, E, UD>,
    S: AsyncRead + AsyncWrite + Unpin,
    E: std::error::Error,
{
    config: Arc<FtpClientConfig>,
    server: String,
    control: FtpControlChannel<S>,
    connection_provider: CP,
    list_parser: Arc<dyn FtpEntryParser>,
    transfer_type: Option<FtpTransferType>,
    pending: Option<FtpCommand>,
    _phantom: PhantomData<(E, UD)>,
}

impl<CP, S, E, UD> FtpClient<CP, S, E, UD>
where
    CP: FtpConnectionProvider<S, E, UD>,
    S: AsyncRead + AsyncWrite + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Open the control connection and wait for the server greeting.
    ///
    /// The connection provider is handed back on failure.
    pub async fn connect_to(
        server: &str,
        mut connection_provider: CP,
        user_data: &UD,
        config: &Arc<FtpClientConfig>,
    ) -> Result<Self, (FtpConnectError<E>, CP)> {
        let r = tokio::time::timeout(
            config.connect_timeout,
            connection_provider.new_control_connection(server, user_data),
        )
        .await;
        let stream = match r {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err((FtpConnectError::ConnectIoError(e), connection_provider));
            }
            Err(_) => return Err((FtpConnectError::ConnectTimedOut, connection_provider)),
        };

        let mut control = FtpControlChannel::new(stream, config.control.clone());
        match tokio::time::timeout(config.greeting_timeout, control.wait_greetings()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err((e.into(), connection_provider)),
            Err(_) => return Err((FtpConnectError::GreetingTimedOut, connection_provider)),
        }
        log_msg!("connected to ftp server {}", server);

        Ok(FtpClient {
            config: Arc::clone(config),
            server: server.to_string(),
            control,
            connection_provider,
            list_parser: Arc::from(config.list_format.build_parser()),
            transfer_type: None,
            pending: None,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn connection_provider(&self) -> &CP {
        &self.connection_provider
    }

    #[inline]
    pub fn config(&self) -> &FtpClientConfig {
        &self.config
    }

    /// The most recent reply on the control connection.
    #[inline]
    pub fn last_reply(&self) -> Option<&Reply> {
        self.control.last_reply()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ReplyListener>) {
        self.control.add_listener(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn ReplyListener>) {
        self.control.remove_listener(listener);
    }

    /// Replace the parser used for new listings.
    pub fn set_list_parser(&mut self, parser: Arc<dyn FtpEntryParser>) {
        self.list_parser = parser;
    }

    #[inline]
    pub fn transfer_end_wait_timeout(&self) -> Duration {
        self.config.transfer.end_wait_timeout
    }

    #[inline]
    pub fn transfer_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn check_idle(&self) -> Result<(), FtpCommandError> {
        match self.pending {
            Some(cmd) => Err(FtpCommandError::TransferPending(cmd)),
            None => Ok(()),
        }
    }

    /// Log in, with anonymous credentials if none are given.
    pub async fn new_user_session(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), FtpSessionOpenError> {
        self.check_idle()?;

        match self.control.send_username(username).await? {
            FtpAuthStatus::LoggedIn => return Ok(()),
            FtpAuthStatus::NotLoggedIn => return Err(FtpSessionOpenError::NotLoggedIn),
            FtpAuthStatus::NeedAccount => return Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NeedPassword => {}
        }

        self.control.send_password(password).await?.finish()
    }

    /// Send ACCT after [`FtpSessionOpenError::AccountIsNeeded`].
    pub async fn send_account(&mut self, account: &str) -> Result<(), FtpSessionOpenError> {
        self.check_idle()?;

        self.control.send_account(account).await?.finish()
    }

    async fn ensure_transfer_type(&mut self, t: FtpTransferType) -> Result<(), FtpCommandError> {
        if self.transfer_type != Some(t) {
            self.control.request_transfer_type(t).await?;
            self.transfer_type = Some(t);
        }
        Ok(())
    }

    async fn request_data_addr(&mut self) -> Result<FtpDataAddr, FtpCommandError> {
        match self.config.passive_mode {
            FtpPassiveMode::Pasv => self.control.request_pasv_port().await,
            FtpPassiveMode::Epsv => match self.control.request_epsv_port().await {
                Err(FtpCommandError::CommandNotImplemented(_)) => {
                    log_msg!("EPSV not supported by {}, fallback to PASV", self.server);
                    self.control.request_pasv_port().await
                }
                r => r,
            },
        }
    }

    async fn new_data_connection(&mut self, user_data: &UD) -> Result<S, FtpTransferSetupError> {
        let data_addr = self.request_data_addr().await?;
        log_msg!("connecting to data address {}", data_addr);

        let r = tokio::time::timeout(
            self.config.connect_timeout,
            self.connection_provider
                .new_data_connection(data_addr, user_data),
        )
        .await;
        match r {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FtpTransferSetupError::ConnectFailed(Box::new(e))),
            Err(_) => Err(FtpTransferSetupError::ConnectTimedOut),
        }
    }

    async fn list_lines(
        &mut self,
        cmd: FtpCommand,
        path: Option<&str>,
        user_data: &UD,
    ) -> Result<Vec<String>, FtpFileListError> {
        self.check_idle().map_err(FtpFileRetrieveStartError::from)?;
        self.ensure_transfer_type(FtpTransferType::Ascii)
            .await
            .map_err(FtpFileRetrieveStartError::from)?;
        let data_stream = self
            .new_data_connection(user_data)
            .await
            .map_err(FtpFileRetrieveStartError::from)?;
        self.control.start_list(cmd, path).await?;

        let mut lines = Vec::new();
        let mut transfer = FtpLineDataTransfer::new(data_stream, &self.config.transfer);
        let list_timeout = self.config.transfer.list_all_timeout();
        let r = tokio::time::timeout(list_timeout, transfer.read_to_end(&mut lines)).await;
        let data_r = match r {
            Ok(r) => r.err(),
            Err(_) => {
                drop(transfer);
                if let Err(e) = self.control.abort_transfer().await {
                    log::warn!("failed to abort timed out {cmd} on {}: {e}", self.server);
                }
                return Err(FtpFileListError::TimeoutToWaitAllData {
                    received: lines.len(),
                });
            }
        };
        // the data connection must be closed before the end reply is awaited
        drop(transfer);

        let end_r = self
            .control
            .wait_transfer_end(cmd, self.config.transfer.end_wait_timeout)
            .await;
        match FtpFileListError::from_parts(lines.len(), data_r, end_r) {
            Some(e) => Err(e),
            None => {
                log_msg!("{} received {} lines", cmd, lines.len());
                Ok(lines)
            }
        }
    }

    /// Run LIST and capture the whole listing.
    ///
    /// Entries are parsed later, on demand, with the configured parser.
    pub async fn list_directory(
        &mut self,
        path: Option<&str>,
        user_data: &UD,
    ) -> Result<FtpListing, FtpFileListError> {
        let lines = self.list_lines(FtpCommand::LIST, path, user_data).await?;
        Ok(FtpListing::new(lines, Arc::clone(&self.list_parser)))
    }

    /// Run MLSD, with a listing set up for the machine readable format.
    pub async fn list_directory_facts(
        &mut self,
        path: Option<&str>,
        user_data: &UD,
    ) -> Result<FtpListing, FtpFileListError> {
        let lines = self.list_lines(FtpCommand::MLSD, path, user_data).await?;
        Ok(FtpListing::new(lines, Arc::new(MlsxEntryParser)))
    }

    /// Run NLST and return the plain names.
    pub async fn list_names(
        &mut self,
        path: Option<&str>,
        user_data: &UD,
    ) -> Result<Vec<String>, FtpFileListError> {
        let mut lines = self.list_lines(FtpCommand::NLST, path, user_data).await?;
        lines.retain(|l| !l.is_empty());
        Ok(lines)
    }

    /// Start a RETR, optionally from `offset`, and return the data stream.
    ///
    /// [`FtpClient::complete_pending_transfer`] must be called after the data is read.
    pub async fn start_retrieve(
        &mut self,
        path: &str,
        offset: u64,
        user_data: &UD,
    ) -> Result<S, FtpFileRetrieveStartError> {
        self.check_idle()?;
        self.ensure_transfer_type(FtpTransferType::Image).await?;
        let data_stream = self.new_data_connection(user_data).await?;
        if offset > 0 {
            self.control.request_restart(offset).await?;
        }
        self.control.start_retrieve(path).await?;
        self.pending = Some(FtpCommand::RETR);
        Ok(data_stream)
    }

    /// Start a STOR and return the data stream.
    ///
    /// [`FtpClient::complete_pending_transfer`] must be called after the data is written.
    pub async fn start_store(
        &mut self,
        path: &str,
        user_data: &UD,
    ) -> Result<S, FtpFileStoreStartError> {
        self.check_idle()?;
        self.ensure_transfer_type(FtpTransferType::Image).await?;
        let data_stream = self.new_data_connection(user_data).await?;
        self.control.start_store(path).await?;
        self.pending = Some(FtpCommand::STOR);
        Ok(data_stream)
    }

    /// Close the data stream and consume the reply that ends the pending transfer.
    ///
    /// `data_error` is the error met on the data side, if any. Both sides are
    /// reported when both failed.
    pub async fn complete_pending_transfer(
        &mut self,
        mut data_stream: S,
        transferred: u64,
        mut data_error: Option<io::Error>,
    ) -> Result<u64, FtpDataTransferError> {
        let Some(cmd) = self.pending.take() else {
            return match FtpDataTransferError::new(transferred, data_error, Ok(())) {
                Some(e) => Err(e),
                None => Ok(transferred),
            };
        };

        if let Err(e) = data_stream.shutdown().await {
            if data_error.is_none() {
                data_error = Some(e);
            } else {
                log::warn!("failed to close {cmd} data connection to {}: {e}", self.server);
            }
        }
        drop(data_stream);

        let end_r = self
            .control
            .wait_transfer_end(cmd, self.config.transfer.end_wait_timeout)
            .await;
        match FtpDataTransferError::new(transferred, data_error, end_r) {
            Some(e) => {
                log::debug!("{cmd} on {} failed: {e}", self.server);
                Err(e)
            }
            None => {
                log_msg!("{} completed with {} bytes", cmd, transferred);
                Ok(transferred)
            }
        }
    }

    /// Retrieve `path` into `writer`, returning the bytes copied.
    pub async fn retrieve_file<W>(
        &mut self,
        path: &str,
        offset: u64,
        writer: &mut W,
        progress: Option<&mut (dyn StreamCopyProgress + Send)>,
        user_data: &UD,
    ) -> Result<u64, FtpFileTransferError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut data_stream = self.start_retrieve(path, offset, user_data).await?;

        let mut copy = StreamCopy::new(&mut data_stream, writer, &self.config.transfer.copy);
        if let Some(progress) = progress {
            copy = copy.with_progress(progress, None);
        }
        let (transferred, data_error) = split_copy_result(copy.await);

        let n = self
            .complete_pending_transfer(data_stream, transferred, data_error)
            .await?;
        Ok(n)
    }

    /// Store all data from `reader` to `path`, returning the bytes copied.
    pub async fn store_file<R>(
        &mut self,
        path: &str,
        reader: &mut R,
        progress: Option<&mut (dyn StreamCopyProgress + Send)>,
        user_data: &UD,
    ) -> Result<u64, FtpFileTransferError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut data_stream = self.start_store(path, user_data).await?;

        let mut copy = StreamCopy::new(reader, &mut data_stream, &self.config.transfer.copy);
        if let Some(progress) = progress {
            copy = copy.with_progress(progress, None);
        }
        let (transferred, data_error) = split_copy_result(copy.await);

        let n = self
            .complete_pending_transfer(data_stream, transferred, data_error)
            .await?;
        Ok(n)
    }

    /// Abort the pending transfer. The data stream should be dropped before this.
    pub async fn abort_transfer(&mut self) -> Result<(), FtpCommandError> {
        self.pending = None;
        self.control.abort_transfer().await
    }

    pub async fn quit_and_close(mut self) -> Result<(), FtpCommandError> {
        self.check_idle()?;
        self.control.send_quit().await?;
        self.control
            .shutdown()
            .await
            .map_err(FtpCommandError::SendFailed)?;
        log_msg!("disconnected from ftp server {}", self.server);
        Ok(())
    }
}

fn split_copy_result(r: Result<u64, StreamCopyError>) -> (u64, Option<io::Error>) {
    match r {
        Ok(n) => (n, None),
        Err(StreamCopyError::ReadFailed(e, n)) => (n, Some(e)),
        Err(StreamCopyError::WriteFailed(e, n)) => (n, Some(e)),
    }
}
