use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Enquiry;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnquiryRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub product_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct EnquiryList {
    #[schema(value_type = Vec<Enquiry>)]
    pub items: Vec<Enquiry>,
}
