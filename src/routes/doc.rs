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
        auth::{
            LoginRequest, RoleList, SessionResponse, SignupRequest, SignupResponse,
            SwitchRoleRequest, VerifyEmailRequest,
        },
        orders::{
            CheckoutFailure, CheckoutReport, CheckoutRequest, CheckoutLine, OrderList,
            OrderWithItems, UpdateOrderCommentRequest, UpdateOrderStatusRequest,
        },
        products::{CatalogList, CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{CatalogProduct, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    roles::Role,
    routes::{auth, health, orders, products, vendor_orders, vendor_products},
    workflow::OrderStatus,
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
        auth::signup,
        auth::verify_email,
        auth::login,
        auth::list_roles,
        auth::switch_role,
        auth::me,
        products::list_catalog,
        products::get_catalog_product,
        vendor_products::list_products,
        vendor_products::create_product,
        vendor_products::get_product,
        vendor_products::update_product,
        vendor_products::delete_product,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        orders::update_comment,
        vendor_orders::list_orders,
        vendor_orders::get_order,
        vendor_orders::update_status,
        vendor_orders::update_comment,
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            Product,
            CatalogProduct,
            Order,
            OrderItem,
            SignupRequest,
            SignupResponse,
            VerifyEmailRequest,
            LoginRequest,
            SessionResponse,
            SwitchRoleRequest,
            RoleList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CatalogList,
            CheckoutRequest,
            CheckoutLine,
            CheckoutFailure,
            CheckoutReport,
            OrderList,
            OrderWithItems,
            UpdateOrderStatusRequest,
            UpdateOrderCommentRequest,
            Meta,
            ApiResponse<User>,
            ApiResponse<SessionResponse>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CatalogList>,
            ApiResponse<CheckoutReport>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Sign-up, sign-in, email verification and role switching"),
        (name = "Catalog", description = "Customer-facing product catalog"),
        (name = "Vendor products", description = "Vendor catalog management"),
        (name = "Orders", description = "Customer order surface: checkout and status workflow"),
        (name = "Vendor orders", description = "Vendor order processing workflow"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
