//! Example uploading files together with JSON fields.
//!
//! This example shows how to:
//! - Attach files from disk and from memory
//! - Let the MIME type come from the extension or the content
//! - Inspect the encoded request before sending it
//!
//! Run with: `cargo run --example multipart_upload -- path/to/file`

use qengine_client::{mime, BodyPayload, Client, FileAttachment};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("qengine_client=debug")
        .init();

    let client = Client::builder()
        .base_url("https://httpbin.org")?
        .build()?;

    let mut builder = client
        .post("/post")
        .json(json!({"questionID": "q1", "questionVersion": "1.0"}))?
        .file(FileAttachment::from_bytes("question.xml", "<question id=\"q1\"/>"))
        // No extension, so the content decides: image/png
        .file(FileAttachment::from_bytes("logo", b"\x89PNG\r\n\x1a\n....".to_vec()));

    if let Some(path) = std::env::args().nth(1) {
        builder = builder.file(FileAttachment::from_path(path));
    }

    let request = builder.build()?;
    if let BodyPayload::Multipart(multipart) = &request.body {
        println!("Boundary: {}", multipart.boundary());
        for (index, file) in multipart.files().iter().enumerate() {
            println!(
                "  file-{}: {} ({}, {} bytes)",
                index,
                file.filename,
                file.mime_type,
                file.content.len()
            );
        }
        println!("  json: {}", multipart.json());
    }
    println!("Extensions known: {}", mime::table().len());

    let response = client.execute(&request).await?;
    println!("{}", response.status_line);
    println!("{}", response.body);

    Ok(())
}
