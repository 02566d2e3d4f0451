use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use common::remote::{
    ByteStream, ObjectId, ObjectKind, RemoteClient, RemoteEntry, RemoteError, RemoteObjectRef,
};
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE,
    RETRY_AFTER,
};
use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use url::Url;

use super::error::ApiError;
use super::types::{
    CommitSession, ErrorBody, Item, ItemCollection, NamedInParent, NewUploadSession,
    UploadSession, UploadedPart, ITEM_FIELDS, ROOT_FOLDER_ID,
};
use crate::state::ApiConfig;

const PAGE_LIMIT: u64 = 1000;
/// Commit polls before an upload session is given up on
const MAX_COMMIT_ATTEMPTS: u32 = 10;
/// Box sends this with the raw SHA-1 hex, not an MD5
const CONTENT_MD5: &str = "content-md5";
const DIGEST: &str = "digest";

#[derive(Debug, Clone)]
pub struct BoxApiClient {
    base_url: Url,
    upload_url: Url,
    chunked_upload_threshold: u64,
    client: Client,
    // used where a redirect's Location is the answer
    no_redirect: Client,
}

impl BoxApiClient {
    pub fn new(config: &ApiConfig, access_token: &str) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(default_headers.clone())
            .build()?;
        let no_redirect = Client::builder()
            .default_headers(default_headers)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            base_url: with_trailing_slash(&config.base_url),
            upload_url: with_trailing_slash(&config.upload_url),
            chunked_upload_threshold: config.chunked_upload_threshold,
            client,
            no_redirect,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn api(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn item_url(&self, kind: ObjectKind, id: &ObjectId, suffix: &str) -> Result<Url, ApiError> {
        let mut url = self.api(&format!("{}/{}{}", collection(kind), id, suffix))?;
        url.query_pairs_mut().append_pair("fields", ITEM_FIELDS);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Fetch an item whose kind is unknown: folders first, then files
    async fn get_item(&self, id: &ObjectId) -> Result<Item, ApiError> {
        let folder = self.item_url(ObjectKind::Folder, id, "")?;
        match self.call(self.client.get(folder)).await {
            Err(ApiError::HttpStatus {
                status: StatusCode::NOT_FOUND,
                ..
            }) => {
                let file = self.item_url(ObjectKind::File, id, "")?;
                self.call(self.client.get(file)).await
            }
            other => other,
        }
    }

    async fn upload_form(
        &self,
        url: Url,
        attributes: String,
        name: &str,
        data: Bytes,
    ) -> Result<RemoteEntry, ApiError> {
        let length = data.len() as u64;
        let sha1 = sha1_hex(&data);
        let form = Form::new().text("attributes", attributes).part(
            "file",
            Part::stream_with_length(Body::from(data), length).file_name(name.to_string()),
        );

        let request = self
            .client
            .post(url)
            .header(CONTENT_MD5, sha1)
            .multipart(form);
        let uploaded: ItemCollection = self.call(request).await?;
        uploaded_entry(uploaded)
    }

    fn is_large(&self, data: &Bytes) -> bool {
        data.len() as u64 > self.chunked_upload_threshold
    }

    /// Upload through a session: open it, send every part, then commit.
    ///  `session_path` is where the session is opened, relative to the upload API.
    async fn upload_chunked(
        &self,
        session_path: &str,
        request: NewUploadSession<'_>,
        data: Bytes,
    ) -> Result<RemoteEntry, ApiError> {
        let url = self.upload_url.join(session_path)?;
        let session: UploadSession = self.call(self.client.post(url).json(&request)).await?;
        if session.part_size == 0 {
            return Err(ApiError::UnexpectedResponse(format!(
                "upload session {} has a zero part size",
                session.id
            )));
        }
        tracing::debug!(
            "upload session {}: {} bytes in parts of {}",
            session.id,
            data.len(),
            session.part_size
        );

        let session_url = self
            .upload_url
            .join(&format!("files/upload_sessions/{}", session.id))?;
        let total = data.len() as u64;
        let mut parts = Vec::new();
        let mut offset = 0u64;
        while offset < total {
            let end = (offset + session.part_size).min(total);
            let chunk = data.slice(offset as usize..end as usize);
            let request = self
                .client
                .put(session_url.clone())
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(CONTENT_RANGE, format!("bytes {}-{}/{}", offset, end - 1, total))
                .header(DIGEST, sha1_digest(&chunk))
                .body(chunk);
            let uploaded: UploadedPart = self.call(request).await?;
            parts.push(uploaded.part);
            offset = end;
        }

        let commit_url = self
            .upload_url
            .join(&format!("files/upload_sessions/{}/commit", session.id))?;
        let digest = sha1_digest(&data);
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let request = self
                .client
                .post(commit_url.clone())
                .header(DIGEST, digest.as_str())
                .json(&CommitSession { parts: &parts });
            let response = check(request.send().await?).await?;

            // parts are still being processed
            if response.status() == StatusCode::ACCEPTED {
                let wait = retry_after(response.headers()).unwrap_or(1);
                tracing::debug!("upload session {} not ready, retrying in {}s", session.id, wait);
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let committed: ItemCollection = response.json().await?;
            return uploaded_entry(committed);
        }

        Err(ApiError::UnexpectedResponse(format!(
            "upload session {} was not committed after {} attempts",
            session.id, MAX_COMMIT_ATTEMPTS
        )))
    }
}

fn uploaded_entry(uploaded: ItemCollection) -> Result<RemoteEntry, ApiError> {
    uploaded
        .entries
        .first()
        .and_then(Item::to_entry)
        .ok_or_else(|| ApiError::UnexpectedResponse("upload returned no file entry".into()))
}

fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Value for the `Digest` header: the base64 SHA-1 of the data
fn sha1_digest(data: &[u8]) -> String {
    format!("sha={}", STANDARD.encode(Sha1::digest(data)))
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn collection(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::File => "files",
        ObjectKind::Folder => "folders",
    }
}

fn to_entry(item: Item) -> Result<RemoteEntry, ApiError> {
    item.to_entry().ok_or_else(|| {
        ApiError::UnexpectedResponse(format!("item {} is not a file or folder", item.id))
    })
}

/// Turn a non-success response into [`ApiError::HttpStatus`]
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after(response.headers());
    let body = response.text().await?;

    Err(ApiError::HttpStatus {
        status,
        retry_after,
        message: ErrorBody::describe(&body),
    })
}

#[async_trait]
impl RemoteClient for BoxApiClient {
    fn default_root(&self) -> ObjectId {
        ObjectId::from(ROOT_FOLDER_ID)
    }

    async fn stat(&self, id: &ObjectId) -> Result<RemoteEntry, RemoteError> {
        let item = self.get_item(id).await?;
        Ok(to_entry(item)?)
    }

    async fn path_of(&self, id: &ObjectId) -> Result<Vec<String>, RemoteError> {
        if id.as_str() == ROOT_FOLDER_ID {
            return Ok(Vec::new());
        }
        Ok(self.get_item(id).await?.path_names())
    }

    async fn list_children(&self, folder: &ObjectId) -> Result<Vec<RemoteEntry>, RemoteError> {
        let mut entries = Vec::new();
        let mut offset = 0u64;

        loop {
            let mut url = self.api(&format!("folders/{}/items", folder))?;
            url.query_pairs_mut()
                .append_pair("fields", ITEM_FIELDS)
                .append_pair("limit", &PAGE_LIMIT.to_string())
                .append_pair("offset", &offset.to_string());

            tracing::debug!("GET {}", url);
            let page: ItemCollection = self.call(self.client.get(url)).await?;
            let count = page.entries.len() as u64;
            entries.extend(page.entries.iter().filter_map(Item::to_entry));

            offset += count;
            let done = match page.total_count {
                Some(total) => offset >= total,
                None => count < PAGE_LIMIT,
            };
            if count == 0 || done {
                break;
            }
        }
        Ok(entries)
    }

    async fn create_folder(
        &self,
        parent: &ObjectId,
        name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let mut url = self.api("folders")?;
        url.query_pairs_mut().append_pair("fields", ITEM_FIELDS);

        let body = NamedInParent::new(name, parent.as_str());
        let item: Item = self.call(self.client.post(url).json(&body)).await?;
        Ok(to_entry(item)?)
    }

    async fn delete_object(&self, object: &RemoteObjectRef) -> Result<(), RemoteError> {
        let mut url = self.api(&format!("{}/{}", collection(object.kind), object.id))?;
        if object.is_folder() {
            url.query_pairs_mut().append_pair("recursive", "true");
        }
        check(self.client.delete(url).send().await.map_err(ApiError::from)?).await?;
        Ok(())
    }

    async fn move_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let url = self.item_url(object.kind, &object.id, "")?;
        let body = NamedInParent::new(new_name, new_parent.as_str());
        let item: Item = self.call(self.client.put(url).json(&body)).await?;
        Ok(to_entry(item)?)
    }

    async fn copy_object(
        &self,
        object: &RemoteObjectRef,
        new_parent: &ObjectId,
        new_name: &str,
    ) -> Result<RemoteEntry, RemoteError> {
        let url = self.item_url(object.kind, &object.id, "/copy")?;
        let body = NamedInParent::new(new_name, new_parent.as_str());
        let item: Item = self.call(self.client.post(url).json(&body)).await?;
        Ok(to_entry(item)?)
    }

    async fn open_read(
        &self,
        file: &ObjectId,
        range: Option<Range<u64>>,
    ) -> Result<ByteStream, RemoteError> {
        let url = self.api(&format!("files/{}/content", file))?;
        let mut request = self.client.get(url);

        if let Some(range) = range {
            if range.start >= range.end {
                return Ok(stream::empty::<Result<Bytes, RemoteError>>().boxed());
            }
            let header = match range.end {
                u64::MAX => format!("bytes={}-", range.start),
                end => format!("bytes={}-{}", range.start, end - 1),
            };
            request = request.header(RANGE, header);
        }

        let response = check(request.send().await.map_err(ApiError::from)?).await?;
        let body = response
            .bytes_stream()
            .map_err(|err| RemoteError::Transport(err.to_string()));
        Ok(body.boxed())
    }

    async fn upload(
        &self,
        parent: &ObjectId,
        name: &str,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        if self.is_large(&data) {
            let request = NewUploadSession {
                folder_id: Some(parent.as_str()),
                file_size: data.len() as u64,
                file_name: Some(name),
            };
            return Ok(self
                .upload_chunked("files/upload_sessions", request, data)
                .await?);
        }

        let url = self.upload_url.join("files/content").map_err(ApiError::from)?;
        let attributes = serde_json::to_string(&NamedInParent::new(name, parent.as_str()))
            .map_err(anyhow::Error::from)?;
        Ok(self.upload_form(url, attributes, name, data).await?)
    }

    async fn upload_version(
        &self,
        file: &ObjectId,
        data: Bytes,
    ) -> Result<RemoteEntry, RemoteError> {
        if self.is_large(&data) {
            let request = NewUploadSession {
                folder_id: None,
                file_size: data.len() as u64,
                file_name: None,
            };
            let session_path = format!("files/{}/upload_sessions", file);
            return Ok(self.upload_chunked(&session_path, request, data).await?);
        }

        let url = self
            .upload_url
            .join(&format!("files/{}/content", file))
            .map_err(ApiError::from)?;
        let current = self.stat(file).await?;
        Ok(self
            .upload_form(url, "{}".to_string(), &current.name, data)
            .await?)
    }

    async fn download_url(&self, file: &ObjectId) -> Result<String, RemoteError> {
        let url = self.api(&format!("files/{}/content", file))?;
        let response = self
            .no_redirect
            .get(url)
            .send()
            .await
            .map_err(ApiError::from)?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            return location.ok_or_else(|| {
                ApiError::UnexpectedResponse("redirect without a location".into()).into()
            });
        }

        let response = check(response).await?;
        Err(ApiError::UnexpectedResponse(format!(
            "expected a download redirect, got {}",
            response.status()
        ))
        .into())
    }
}
