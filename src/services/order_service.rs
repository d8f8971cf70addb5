use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::AuditEntry,
    cart::{Cart, CartLine, VendorGroup},
    dto::orders::{
        CheckoutFailure, CheckoutReport, CheckoutRequest, OrderList, OrderWithItems,
        UpdateOrderCommentRequest, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    services::product_service::unit_price_for,
    state::AppState,
    workflow::{self, OrderActor, OrderStatus},
};

/// Checkout: split the cart by owning vendor and create one pending
/// order per vendor group. Groups are independent transactions; one
/// vendor's failure never corrupts or hides another's order, and the
/// report attributes every failure to its group.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutReport>> {
    if payload.items.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }
    for line in &payload.items {
        if line.quantity < 1 {
            return Err(AppError::Validation(format!(
                "quantity for product {} must be at least 1",
                line.product_id
            )));
        }
    }

    let ids: Vec<Uuid> = payload.items.iter().map(|l| l.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(crate::entity::products::Column::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut cart = Cart::new();
    for line in &payload.items {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::Validation(format!("unknown product {}", line.product_id)))?;
        let unit_price_cents = unit_price_for(user.role, product)?;
        cart.add(CartLine {
            product_id: product.id,
            vendor_id: product.tenant_id,
            name: product.name.clone(),
            unit_price_cents,
            quantity: line.quantity,
        });
    }

    let mut orders = Vec::new();
    let mut failures = Vec::new();

    for group in cart.grouped_by_vendor() {
        match create_group_order(state, user, &group, &products).await {
            Ok(order) => orders.push(order),
            Err(err) => {
                tracing::warn!(vendor_id = %group.vendor_id, error = %err, "checkout group failed");
                failures.push(CheckoutFailure {
                    vendor_id: group.vendor_id,
                    error: err.to_string(),
                });
            }
        }
    }

    if orders.is_empty() {
        let detail = failures
            .iter()
            .map(|f| format!("vendor {}: {}", f.vendor_id, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Validation(format!("no orders created: {detail}")));
    }

    let entry = AuditEntry {
        user_id: Some(user.user_id),
        action: "checkout",
        resource: "orders",
        metadata: serde_json::json!({
            "orders": orders.iter().map(|o| o.order.id).collect::<Vec<_>>(),
            "failed_vendors": failures.iter().map(|f| f.vendor_id).collect::<Vec<_>>(),
        }),
    };
    if let Err(err) = entry.record(&state.pool).await {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = if failures.is_empty() {
        "Checkout completed"
    } else {
        "Checkout partially completed"
    };
    Ok(ApiResponse::success(
        message,
        CheckoutReport { orders, failures },
        Some(Meta::empty()),
    ))
}

async fn create_group_order(
    state: &AppState,
    user: &AuthUser,
    group: &VendorGroup,
    products: &HashMap<Uuid, ProductModel>,
) -> AppResult<OrderWithItems> {
    // The catalog hides the caller's own listings; checkout enforces
    // the same rule so it cannot be bypassed by raw product id.
    if group.vendor_id == user.user_id {
        return Err(AppError::Forbidden);
    }

    for line in &group.lines {
        if let Some(product) = products.get(&line.product_id) {
            if line.quantity < product.min_quantity {
                return Err(AppError::Validation(format!(
                    "product {} requires a minimum quantity of {}",
                    product.name, product.min_quantity
                )));
            }
        }
    }

    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        placed_as: Set(user.role.as_str().to_string()),
        vendor_id: Set(group.vendor_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        total_cents: Set(group.total_cents()),
        customer_comment: Set(String::new()),
        vendor_comment: Set(String::new()),
        archived: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::new();
    for line in &group.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name.clone()),
            quantity: Set(line.quantity),
            unit_price_cents: Set(line.unit_price_cents),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    Ok(OrderWithItems {
        order: order_from_entity(order)?,
        items,
    })
}

/// Customer listing is scoped to the identity AND the role it ordered
/// under: orders placed as `customer` stay invisible while acting as
/// `b2b-customer`, even though it is the same account.
pub async fn list_customer_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let items = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::CustomerId.eq(user.user_id))
                .add(OrderCol::PlacedAs.eq(user.role.as_str())),
        )
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Vendor listing covers every order bound to the vendor, regardless
/// of which customer role placed it.
pub async fn list_vendor_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let items = Orders::find()
        .filter(OrderCol::VendorId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    actor: OrderActor,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) if is_owner(&o, user, actor) => o,
        // Reads never leak other parties' orders.
        _ => return Err(AppError::NotFound),
    };

    let items = fetch_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Apply a status transition as the given actor.
///
/// Check order: ownership (Forbidden) before transition validity
/// (InvalidTransition). The write is a compare-and-swap keyed on the
/// status the caller observed; a concurrent change surfaces as
/// Conflict, never last-writer-wins.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    actor: OrderActor,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !is_owner(&order, user, actor) {
        return Err(AppError::Forbidden);
    }

    let current: OrderStatus = order
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if current != payload.expected_status {
        return Err(AppError::Conflict);
    }

    workflow::check_transition(actor, current, payload.status)?;

    let archived = order.archived || workflow::marks_archived(actor, current, payload.status);
    let audit_line = workflow::status_audit_line(payload.status, actor);
    let (comment_col, existing_comment) = match actor {
        OrderActor::Customer => (OrderCol::CustomerComment, order.customer_comment.as_str()),
        OrderActor::Vendor => (OrderCol::VendorComment, order.vendor_comment.as_str()),
    };
    let new_comment = workflow::append_comment(existing_comment, &audit_line);

    // Conditional write: only lands if the status is still the one we
    // validated against.
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(payload.status.as_str()))
        .col_expr(comment_col, Expr::value(new_comment))
        .col_expr(OrderCol::Archived, Expr::value(archived))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order.id))
                .add(OrderCol::Status.eq(current.as_str())),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict);
    }

    let entry = AuditEntry {
        user_id: Some(user.user_id),
        action: "order_status",
        resource: "orders",
        metadata: serde_json::json!({
            "order_id": order.id,
            "from": current.as_str(),
            "to": payload.status.as_str(),
            "actor": actor.as_str(),
        }),
    };
    if let Err(err) = entry.record(&state.pool).await {
        tracing::warn!(error = %err, "audit log failed");
    }

    reload_order(state, order.id).await
}

/// Append to the acting party's comment log. Comments are never
/// replaced; each update adds a line.
pub async fn update_comment(
    state: &AppState,
    user: &AuthUser,
    actor: OrderActor,
    id: Uuid,
    payload: UpdateOrderCommentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let entry = payload.comment.trim();
    if entry.is_empty() {
        return Err(AppError::Validation("comment cannot be empty".into()));
    }

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !is_owner(&order, user, actor) {
        return Err(AppError::Forbidden);
    }

    let mut active: OrderActive = order.clone().into();
    match actor {
        OrderActor::Customer => {
            active.customer_comment =
                Set(workflow::append_comment(&order.customer_comment, entry));
        }
        OrderActor::Vendor => {
            active.vendor_comment = Set(workflow::append_comment(&order.vendor_comment, entry));
        }
    }
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    reload_order(state, id).await
}

fn is_owner(order: &OrderModel, user: &AuthUser, actor: OrderActor) -> bool {
    match actor {
        OrderActor::Customer => order.customer_id == user.user_id,
        OrderActor::Vendor => order.vendor_id == user.user_id,
    }
}

async fn reload_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = fetch_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order updated",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn fetch_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(items)
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let placed_as = model
        .placed_as
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        placed_as,
        vendor_id: model.vendor_id,
        status,
        total_cents: model.total_cents,
        customer_comment: model.customer_comment,
        vendor_comment: model.vendor_comment,
        archived: model.archived,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        quantity: model.quantity,
        unit_price_cents: model.unit_price_cents,
    }
}
