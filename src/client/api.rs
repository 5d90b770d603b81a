//! Direct backend client for chat, file and PDF endpoints
//!
//! Unlike the auth store, these calls skip the gateway and go straight to
//! the public API origin.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::auth::store::{endpoint, expect_success, failure_from};
use crate::error::Result;

/// File attached to a multipart upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn into_part(self) -> Result<Part> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        Ok(match self.mime {
            Some(mime) => part.mime_str(&mime)?,
            None => part,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(api_url: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(api_url)?,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        endpoint(&self.base, path, None)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Value> {
        let response = self.http.post(self.url(path)?).json(body).send().await?;
        expect_success(response, fallback).await
    }

    async fn post_file(&self, path: &str, field: &str, upload: Upload, fallback: &str) -> Result<Value> {
        let form = Form::new().part(field.to_string(), upload.into_part()?);
        let response = self.http.post(self.url(path)?).multipart(form).send().await?;
        expect_success(response, fallback).await
    }

    async fn get_bytes(&self, url: Url, token: Option<&str>, fallback: &str) -> Result<Bytes> {
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(failure_from(response, fallback).await);
        }
        Ok(response.bytes().await?)
    }

    // Chat

    pub async fn send_message(&self, message: &str) -> Result<Value> {
        self.post_json("/chat/text", &json!({ "message": message }), "Failed to send message")
            .await
    }

    pub async fn send_voice(&self, audio: Upload) -> Result<Value> {
        self.post_file("/chat/voice", "audio", audio, "Failed to process voice")
            .await
    }

    /// Synthesized speech audio
    pub async fn text_to_speech(&self, text: &str) -> Result<Bytes> {
        let response = self
            .http
            .post(self.url("/chat/text-to-speech")?)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(failure_from(response, "Failed to convert text to speech").await);
        }
        Ok(response.bytes().await?)
    }

    // Files

    pub async fn upload_file(&self, file: Upload) -> Result<Value> {
        self.post_file("/files/upload", "file", file, "Failed to upload file")
            .await
    }

    pub async fn process_image(&self, image: Upload) -> Result<Value> {
        self.post_file("/files/process-image", "image", image, "Failed to process image")
            .await
    }

    // PDF

    pub async fn generate_story(&self, prompt: &str) -> Result<Value> {
        self.post_json("/pdf/generate-story", &json!({ "prompt": prompt }), "Failed to generate story")
            .await
    }

    pub async fn generate_custom_pdf(&self, prompt: &str, template_type: &str) -> Result<Value> {
        self.post_json(
            "/pdf/generate-custom",
            &json!({ "prompt": prompt, "template_type": template_type }),
            "Failed to generate custom PDF",
        )
        .await
    }

    pub async fn list_pdfs(&self) -> Result<Value> {
        let response = self.http.get(self.url("/pdf/files")?).send().await?;
        expect_success(response, "Failed to list PDFs").await
    }

    pub async fn download_pdf(&self, file_id: &str) -> Result<Bytes> {
        let url = endpoint(&self.base, "/pdf/download", Some(file_id))?;
        self.get_bytes(url, None, "Failed to download PDF").await
    }

    /// Download a PDF from the authenticated content history
    pub async fn download_content_pdf(&self, filename: &str, token: &str) -> Result<Bytes> {
        let url = endpoint(&self.base, "/api/pdf/download", Some(filename))?;
        self.get_bytes(url, Some(token), "Failed to download PDF").await
    }
}
