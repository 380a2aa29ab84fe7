//! Job description loading: from a URL or a local file.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::errors::AppError;

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetches the raw body of `url`. No parsing, no retry.
pub async fn fetch_job_description(url: &str, timeout: Duration) -> Result<String, AppError> {
    info!("Fetching job description from {url}");
    let client = Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Uses the `description` value when the file is a YAML mapping carrying one,
/// otherwise the whole file text.
pub fn description_from_file_content(content: &str) -> String {
    let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str::<serde_yaml::Value>(content)
    else {
        return content.to_string();
    };
    match map.get("description") {
        Some(serde_yaml::Value::String(text)) => text.clone(),
        Some(other) => serde_yaml::to_string(other).unwrap_or_else(|_| content.to_string()),
        None => content.to_string(),
    }
}

pub async fn load_job_description_from_file(path: &Path) -> Result<String, AppError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(description_from_file_content(&content))
}

/// Resolves `source` as a URL (http/https) or a file path.
pub async fn load_job_description(source: &str, fetch_timeout: Duration) -> Result<String, AppError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(AppError::Invalid("job description source is empty".to_string()));
    }
    if is_url(source) {
        fetch_job_description(source, fetch_timeout).await
    } else {
        load_job_description_from_file(Path::new(source)).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://jobs.example.com/123"));
        assert!(is_url("http://localhost/jd"));
        assert!(!is_url("jobs/backend.yaml"));
    }

    #[test]
    fn test_description_key_is_used() {
        let content = "title: Backend Engineer\ndescription: Build Rust services.\n";
        assert_eq!(description_from_file_content(content), "Build Rust services.");
    }

    #[test]
    fn test_structured_description_is_reserialized() {
        let content = "description:\n  - Rust\n  - Tokio\n";
        let text = description_from_file_content(content);
        assert!(text.contains("- Rust"));
        assert!(text.contains("- Tokio"));
    }

    #[test]
    fn test_plain_text_is_used_verbatim() {
        let content = "We are hiring: a Rust engineer.\nRemote OK.";
        assert_eq!(description_from_file_content(content), content);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "description: Platform role").unwrap();
        let text = load_job_description(file.path().to_str().unwrap(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(text, "Platform role");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let result =
            load_job_description("/nonexistent/jd.yaml", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(AppError::Read { .. })));
    }
}
