use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::OptimizeError;

/// An image payload as carried inside a post: `data:<mime>;base64,<payload>`
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<DataUri, OptimizeError> {
        let Some(rest) = uri.trim().strip_prefix("data:") else {
            return Err(OptimizeError::Decode("Not a data URI".to_string()));
        };

        let Some((meta, payload)) = rest.split_once(',') else {
            return Err(OptimizeError::Decode("Data URI without payload".to_string()));
        };

        let Some(mime) = meta.strip_suffix(";base64") else {
            return Err(OptimizeError::Decode(format!("Data URI is not base64 encoded ({})", meta)));
        };

        let data = STANDARD.decode(payload.trim())
            .map_err(|e| OptimizeError::Decode(format!("Invalid base64 payload: {}", e)))?;

        Ok(DataUri {
            mime: mime.to_string(),
            data,
        })
    }

    pub fn format(mime: &str, data: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(data))
    }
}
