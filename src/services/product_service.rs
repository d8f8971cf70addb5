use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::AuditEntry,
    dto::products::{CatalogList, CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CatalogProduct, Product},
    response::{ApiResponse, Meta},
    roles::Role,
    state::AppState,
};

/// Unit price a customer sees, selected by active role. Vendors have
/// no customer price view; the exhaustive match keeps that explicit.
pub(crate) fn unit_price_for(role: Role, product: &ProductModel) -> AppResult<i64> {
    match role {
        Role::Customer => Ok(product.retail_price_cents),
        Role::B2bCustomer => Ok(product.b2b_price_cents),
        Role::Vendor => Err(AppError::Forbidden),
    }
}

/// Customer catalog: every product except the caller's own listings.
/// A vendor browsing under a customer role never sees their own stock.
pub async fn list_catalog(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CatalogList>> {
    let models = Products::find()
        .filter(Column::TenantId.ne(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = models
        .into_iter()
        .map(|m| catalog_from_entity(m, user.role))
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Products", CatalogList { items }, Some(meta)))
}

pub async fn get_catalog_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CatalogProduct>> {
    let model = Products::find_by_id(id).one(&state.orm).await?;
    let model = match model {
        // The tenant-exclusion filter applies to point reads too.
        Some(m) if m.tenant_id != user.user_id => m,
        _ => return Err(AppError::NotFound),
    };
    let product = catalog_from_entity(model, user.role)?;
    Ok(ApiResponse::success("Product", product, None))
}

/// Vendor listing: only the caller's own tenant.
pub async fn list_own_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    let items = Products::find()
        .filter(Column::TenantId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect::<Vec<_>>();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.min_quantity < 1 {
        return Err(AppError::Validation("min_quantity must be at least 1".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(user.user_id),
        sku: Set(payload.sku),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        stock: Set(payload.stock),
        retail_price_cents: Set(payload.retail_price_cents),
        b2b_price_cents: Set(payload.b2b_price_cents),
        paid_cost_cents: Set(payload.paid_cost_cents),
        allow_loose: Set(payload.allow_loose),
        min_quantity: Set(payload.min_quantity),
        image_url: Set(payload.image_url),
        created_at: NotSet,
        updated_at: Set(None),
    };
    let product = active.insert(&state.orm).await?;

    audit_product(state, user, "product_create", product.id).await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn get_own_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = find_owned(state, user, id).await?;
    Ok(ApiResponse::success("Product", product_from_entity(product), None))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_owned(state, user, id).await?;

    if let Some(min_quantity) = payload.min_quantity {
        if min_quantity < 1 {
            return Err(AppError::Validation("min_quantity must be at least 1".into()));
        }
    }

    // tenant_id deliberately untouched: ownership is fixed at creation.
    let mut active: ActiveModel = existing.into();
    if let Some(sku) = payload.sku {
        active.sku = Set(sku);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(price) = payload.retail_price_cents {
        active.retail_price_cents = Set(price);
    }
    if let Some(price) = payload.b2b_price_cents {
        active.b2b_price_cents = Set(price);
    }
    if let Some(cost) = payload.paid_cost_cents {
        active.paid_cost_cents = Set(cost);
    }
    if let Some(allow_loose) = payload.allow_loose {
        active.allow_loose = Set(allow_loose);
    }
    if let Some(min_quantity) = payload.min_quantity {
        active.min_quantity = Set(min_quantity);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(Some(Utc::now().into()));

    let product = active.update(&state.orm).await?;

    audit_product(state, user, "product_update", product.id).await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_many()
        .filter(
            Condition::all()
                .add(Column::Id.eq(id))
                .add(Column::TenantId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit_product(state, user, "product_delete", id).await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn audit_product(state: &AppState, user: &AuthUser, action: &str, product_id: Uuid) {
    let entry = AuditEntry {
        user_id: Some(user.user_id),
        action,
        resource: "products",
        metadata: serde_json::json!({ "product_id": product_id }),
    };
    if let Err(err) = entry.record(&state.pool).await {
        tracing::warn!(error = %err, "audit log failed");
    }
}

/// Fetch a product scoped to the caller's tenant. Other tenants'
/// products are indistinguishable from missing ones.
async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ProductModel> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    match product {
        Some(p) if p.tenant_id == user.user_id => Ok(p),
        _ => Err(AppError::NotFound),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        tenant_id: model.tenant_id,
        sku: model.sku,
        name: model.name,
        description: model.description,
        category: model.category,
        stock: model.stock,
        retail_price_cents: model.retail_price_cents,
        b2b_price_cents: model.b2b_price_cents,
        paid_cost_cents: model.paid_cost_cents,
        allow_loose: model.allow_loose,
        min_quantity: model.min_quantity,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.map(|dt| dt.with_timezone(&Utc)),
    }
}

fn catalog_from_entity(model: ProductModel, role: Role) -> AppResult<CatalogProduct> {
    let unit_price_cents = unit_price_for(role, &model)?;
    Ok(CatalogProduct {
        id: model.id,
        vendor_id: model.tenant_id,
        sku: model.sku,
        name: model.name,
        description: model.description,
        category: model.category,
        stock: model.stock,
        unit_price_cents,
        allow_loose: model.allow_loose,
        min_quantity: model.min_quantity,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
