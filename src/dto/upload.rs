use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[serde(rename = "filePath")]
    pub file_path: String,
}
