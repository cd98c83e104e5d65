//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from objstor-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_objects_v2::builders::ListObjectsV2FluentBuilder;
use aws_sdk_s3::primitives::ByteStream;
use tokio::io::AsyncWriteExt;

use objstor_core::{
    ContentSource, Error, ListingItem, ListingSink, ListingStream, ObjectStore, Result,
    ResultExt, Settings,
};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    separator: String,
}

impl S3Client {
    /// Create a new S3 client from validated settings and a key pair
    pub async fn new(settings: &Settings, access_key: &str, secret_key: &str) -> Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            access_key,
            secret_key,
            None, // session token
            None, // expiry
            "objstor-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.path_style)
            .build();

        tracing::debug!(
            endpoint = %settings.endpoint,
            region = %settings.region,
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            separator: settings.path_separator.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match sdk_error(&e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<ListingStream> {
        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .fetch_owner(true);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        // Delimiter groups keys into one level of "directories"
        if !recursive {
            request = request.delimiter(&self.separator);
        }

        let target = format!("{bucket}/{prefix}");
        tracing::debug!(bucket, prefix, recursive, "opening listing stream");
        Ok(ListingStream::spawn(move |sink| {
            produce_listing(request, target, sink)
        }))
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(&e, key))?;

        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: ContentSource,
        content_type: &str,
    ) -> Result<()> {
        let body = match source {
            ContentSource::Bytes(data) => ByteStream::from(data),
            ContentSource::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))
                .context("read", path.display().to_string())?,
        };

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| sdk_error(&e, key))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str, destination: &Path) -> Result<()> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(&e, key))?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(Error::from)
            .context("create", destination.display().to_string())?;

        if let Err(e) = write_body(response.body, &mut file).await {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(destination).await {
                tracing::warn!(
                    path = %destination.display(),
                    "failed to remove partial download: {cleanup}"
                );
            }
            return Err(e);
        }

        Ok(())
    }
}

async fn write_body(mut body: ByteStream, file: &mut tokio::fs::File) -> Result<()> {
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Drive the ListObjectsV2 paginator, pushing items into `sink`
///
/// Returns as soon as the consumer cancels; dropping the paginator releases
/// the connection.
async fn produce_listing(
    request: ListObjectsV2FluentBuilder,
    target: String,
    mut sink: ListingSink,
) {
    let mut pages = request.into_paginator().send();
    let mut page_count = 0usize;

    while let Some(page) = pages.next().await {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                let err = if page_count == 0 {
                    sdk_error(&e, &target)
                } else {
                    Error::Stream(format!("{target}: {}", DisplayErrorContext(&e)))
                };
                let _ = sink.send(Err(err)).await;
                return;
            }
        };
        page_count += 1;

        for prefix in page.common_prefixes() {
            if let Some(p) = prefix.prefix() {
                if !sink.send(Ok(ListingItem::prefix(p))).await {
                    tracing::debug!(%target, "listing cancelled");
                    return;
                }
            }
        }

        for object in page.contents() {
            let mut item = ListingItem::object(
                object.key().unwrap_or_default(),
                object.size().unwrap_or(0),
            );
            if let Some(modified) = object.last_modified() {
                item.last_modified = to_timestamp(modified);
            }
            if let Some(owner) = object.owner().and_then(|o| o.display_name()) {
                item.owner = Some(owner.to_string());
            }

            if !sink.send(Ok(item)).await {
                tracing::debug!(%target, "listing cancelled");
                return;
            }
        }

        if sink.is_cancelled() {
            return;
        }
    }

    tracing::trace!(%target, pages = page_count, "listing complete");
}

fn to_timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

/// Map an SDK failure onto the core error taxonomy
fn sdk_error<E>(err: &SdkError<E>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify(
        err.code(),
        status,
        &DisplayErrorContext(err).to_string(),
        target,
    )
}

fn classify(code: Option<&str>, status: Option<u16>, message: &str, target: &str) -> Error {
    match (code, status) {
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, Some(404)) => {
            Error::NotFound(target.to_string())
        }
        (
            Some(
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"
                | "AllAccessDisabled",
            ),
            _,
        )
        | (_, Some(401 | 403)) => Error::Auth(format!("{target}: {message}")),
        _ => Error::Network(format!("{target}: {message}")),
    }
}
