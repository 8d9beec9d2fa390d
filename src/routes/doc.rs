use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        categories::CategoryList,
        editor::{AttachRequest, OpenSessionRequest, SessionSearchRequest},
        enquiries::{CreateEnquiryRequest, EnquiryList},
        products::{InformationUpdate, ProductDetail, ProductList},
        upload::UploadResponse,
    },
    editor::{
        CategoryEdit, EditorEntity, EditorState, EntityEdit, EntityKind, LoadFailure, ProductEdit,
        RefTarget, SearchScope, TextList,
        resolver::SummaryList,
        session::SessionSnapshot,
    },
    models::{Category, Enquiry, Faq, Product, ProductDetails, ProductSummary, Review, SpecValue},
    response::{ApiResponse, Meta},
    routes::{
        auth, catalog, categories, editor, enquiries, health, params, products, upload,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        catalog::get_category,
        catalog::create_enquiry,
        products::list_products,
        products::search_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::update_information,
        products::delete_product,
        categories::list_categories,
        categories::search_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        enquiries::list_enquiries,
        enquiries::get_enquiry,
        enquiries::delete_enquiry,
        upload::upload_image,
        editor::open_session,
        editor::get_session,
        editor::apply_edit,
        editor::search,
        editor::attach,
        editor::detach,
        editor::submit,
        editor::close_session
    ),
    components(
        schemas(
            Product,
            ProductDetails,
            ProductSummary,
            SpecValue,
            Faq,
            Review,
            Category,
            Enquiry,
            LoginRequest,
            LoginResponse,
            ProductList,
            ProductDetail,
            InformationUpdate,
            CategoryList,
            EnquiryList,
            CreateEnquiryRequest,
            UploadResponse,
            OpenSessionRequest,
            SessionSearchRequest,
            AttachRequest,
            SessionSnapshot,
            EditorState,
            EditorEntity,
            LoadFailure,
            EntityKind,
            EntityEdit,
            ProductEdit,
            CategoryEdit,
            TextList,
            SummaryList,
            RefTarget,
            SearchScope,
            params::Pagination,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Category>,
            ApiResponse<SessionSnapshot>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Admin login"),
        (name = "Catalog", description = "Public storefront endpoints"),
        (name = "Products", description = "Product administration"),
        (name = "Categories", description = "Category administration"),
        (name = "Enquiries", description = "Customer enquiries"),
        (name = "Upload", description = "Image upload"),
        (name = "Editor", description = "Server-side editor sessions"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
