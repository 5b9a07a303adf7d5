//! File downloads for shared content.

use colloquy_core::{
  Error, Result,
  activity::SharedFile,
  encryption::{DownloadedFile, Encryptor, ProgressSender},
  identity::IdentityResolver,
  normalize::Normalizer,
  transport::Transport,
};

use crate::ConversationClient;

impl<T, E, I, N> ConversationClient<T, E, I, N>
where
  T: Transport,
  E: Encryptor,
  I: IdentityResolver,
  N: Normalizer,
{
  /// Download a shared file. Encrypted files (with an `scr`) go through the
  /// encryption collaborator; plain files are fetched from their url.
  pub async fn download(
    &self,
    file: &SharedFile,
    progress: Option<ProgressSender>,
  ) -> Result<DownloadedFile> {
    let mut downloaded = match (&file.scr, &file.url) {
      (Some(scr), _) => self
        .encryptor()
        .download(scr, progress.as_ref())
        .await
        .map_err(Error::encryption)?,
      (None, Some(url)) => {
        DownloadedFile::new(self.transport().download(url, progress.as_ref()).await?)
      }
      (None, None) => return Err(Error::validation("file has neither `scr` nor `url`")),
    };
    tracing::info!(bytes = downloaded.bytes.len(), "file downloaded");

    if downloaded.name.is_none() {
      downloaded.name.clone_from(&file.display_name);
    }
    if downloaded.mime_type.is_none() {
      downloaded.mime_type.clone_from(&file.mime_type);
    }
    Ok(downloaded)
  }
}
