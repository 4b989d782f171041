//! Image-to-text extraction via the `tesseract` CLI.

use crate::loader::types::ExtractError;
use std::path::Path;
use std::process::Command;

/// Check whether the tesseract binary is available on this host.
pub fn has_tesseract() -> bool {
    Command::new("tesseract")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run OCR over an image file and return the recognized text.
///
/// The returned text may be empty or whitespace-only for blank images; the
/// loader decides whether an empty result produces a record.
pub fn ocr_image(path: &Path) -> Result<String, ExtractError> {
    if !has_tesseract() {
        return Err(ExtractError::Ocr(
            "tesseract binary not found; install tesseract-ocr".to_string(),
        ));
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| ExtractError::Ocr("image path is not valid UTF-8".to_string()))?;

    let output = Command::new("tesseract")
        .args([path_str, "stdout", "-l", "eng"])
        .output()
        .map_err(|err| ExtractError::Ocr(format!("failed to spawn tesseract: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::Ocr(format!("tesseract error: {stderr}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
