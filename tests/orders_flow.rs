use local_commerce_api::{
    db::{create_orm_conn, create_pool},
    dto::{
        auth::{LoginRequest, SignupRequest, SwitchRoleRequest, VerifyEmailRequest},
        orders::{CheckoutLine, CheckoutRequest, UpdateOrderCommentRequest, UpdateOrderStatusRequest},
        products::CreateProductRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    roles::Role,
    services::{auth_service, order_service, product_service},
    state::{AppState, JwtKeys},
    workflow::{OrderActor, OrderStatus},
};
use uuid::Uuid;

// Integration flow: signup grows a role set and switches roles; two
// vendors list products; a customer checkout splits per vendor; both
// parties walk the status tables, including the conflict and ownership
// rejections. Runs against a real database; skipped when none is
// configured.
#[tokio::test]
async fn marketplace_end_to_end_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // --- Signup, verification, login, role growth, switch-role ---

    let signup = auth_service::signup(
        &state,
        SignupRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Customer,
            display_name: Some("Alice".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(signup.user.roles, vec![Role::Customer]);
    let verification_token = signup.verification_token.expect("verification token");

    // Repeating the held role is a conflict, not a silent success.
    let err = auth_service::signup(
        &state,
        SignupRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Customer,
            display_name: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::RoleAlreadyExists(Role::Customer)));

    // Login is blocked until the email is verified.
    let err = auth_service::login(
        &state,
        LoginRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Customer,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::EmailNotVerified));

    auth_service::verify_email(
        &state,
        VerifyEmailRequest {
            token: verification_token,
        },
    )
    .await?;

    // A role the account never signed up under is its own outcome.
    let err = auth_service::login(
        &state,
        LoginRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Vendor,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::RoleNotFound(Role::Vendor)));

    let session = auth_service::login(
        &state,
        LoginRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Customer,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(session.user.active_role, Role::Customer);

    // Signing up again under a new role grows the held set.
    let grown = auth_service::signup(
        &state,
        SignupRequest {
            email: "alice@example.com".into(),
            password: "secret1234".into(),
            role: Role::Vendor,
            display_name: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(grown.user.roles.contains(&Role::Customer));
    assert!(grown.user.roles.contains(&Role::Vendor));

    let alice = acting_as(session.user.id, Role::Customer);

    let switched = auth_service::switch_role(&state, &alice, SwitchRoleRequest { role: Role::Vendor })
        .await?
        .data
        .unwrap();
    assert_eq!(switched.user.active_role, Role::Vendor);
    assert!(!switched.token.is_empty());

    // Switching to a role the account does not hold changes nothing.
    let err = auth_service::switch_role(
        &state,
        &alice,
        SwitchRoleRequest {
            role: Role::B2bCustomer,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::RoleNotHeld(Role::B2bCustomer)));

    // --- Catalog: two vendors, tenant exclusion ---

    let vendor_a = create_user(&state, "vendor-a@example.com", &[Role::Vendor, Role::Customer]).await?;
    let vendor_b = create_user(&state, "vendor-b@example.com", &[Role::Vendor]).await?;
    let customer = create_user(&state, "customer@example.com", &[Role::Customer, Role::B2bCustomer]).await?;

    let product_a = product_service::create_product(
        &state,
        &acting_as(vendor_a, Role::Vendor),
        product_request("SKU-A", "Tomatoes", 1000, 800),
    )
    .await?
    .data
    .unwrap();
    let product_b = product_service::create_product(
        &state,
        &acting_as(vendor_b, Role::Vendor),
        product_request("SKU-B", "Milk", 500, 400),
    )
    .await?
    .data
    .unwrap();

    let shopper = acting_as(customer, Role::Customer);
    let catalog = product_service::list_catalog(&state, &shopper).await?.data.unwrap();
    assert!(catalog.items.iter().any(|p| p.id == product_a.id));
    assert!(catalog.items.iter().any(|p| p.id == product_b.id));

    // Vendor A browsing as a customer never sees their own listing.
    let own_view = product_service::list_catalog(&state, &acting_as(vendor_a, Role::Customer))
        .await?
        .data
        .unwrap();
    assert!(own_view.items.iter().all(|p| p.id != product_a.id));
    assert!(own_view.items.iter().any(|p| p.id == product_b.id));

    // The price on the same product differs by the caller's role.
    let retail_view =
        product_service::get_catalog_product(&state, &shopper, product_a.id)
            .await?
            .data
            .unwrap();
    assert_eq!(retail_view.unit_price_cents, 1000);
    let b2b_view = product_service::get_catalog_product(
        &state,
        &acting_as(customer, Role::B2bCustomer),
        product_a.id,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(b2b_view.unit_price_cents, 800);

    // --- Checkout: one order per vendor group ---

    let report = order_service::checkout(
        &state,
        &shopper,
        CheckoutRequest {
            items: vec![
                CheckoutLine {
                    product_id: product_a.id,
                    quantity: 2,
                },
                CheckoutLine {
                    product_id: product_b.id,
                    quantity: 3,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.orders.len(), 2);

    let order_a = report
        .orders
        .iter()
        .find(|o| o.order.vendor_id == vendor_a)
        .expect("order for vendor A");
    let order_b = report
        .orders
        .iter()
        .find(|o| o.order.vendor_id == vendor_b)
        .expect("order for vendor B");
    assert_eq!(order_a.order.total_cents, 2 * 1000);
    assert_eq!(order_b.order.total_cents, 3 * 500);
    assert_eq!(order_a.order.status, OrderStatus::Pending);
    assert_eq!(order_a.order.placed_as, Role::Customer);

    // A dual-role user checking out their own product fails that group
    // only; the other vendor's group still goes through.
    let mixed = order_service::checkout(
        &state,
        &acting_as(vendor_a, Role::Customer),
        CheckoutRequest {
            items: vec![
                CheckoutLine {
                    product_id: product_a.id,
                    quantity: 1,
                },
                CheckoutLine {
                    product_id: product_b.id,
                    quantity: 1,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(mixed.orders.len(), 1);
    assert_eq!(mixed.orders[0].order.vendor_id, vendor_b);
    assert_eq!(mixed.failures.len(), 1);
    assert_eq!(mixed.failures[0].vendor_id, vendor_a);

    // A line below the product's minimum quantity fails its vendor
    // group; the other group still goes through.
    let bulk = product_service::create_product(
        &state,
        &acting_as(vendor_b, Role::Vendor),
        CreateProductRequest {
            sku: "SKU-BULK".into(),
            name: "Bulk flour".into(),
            description: None,
            category: "dry-goods".into(),
            stock: 100,
            retail_price_cents: 2000,
            b2b_price_cents: 1600,
            paid_cost_cents: 1280,
            allow_loose: false,
            min_quantity: 6,
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();

    // A non-positive quantity rejects the whole request up front.
    let err = order_service::checkout(
        &state,
        &shopper,
        CheckoutRequest {
            items: vec![CheckoutLine {
                product_id: bulk.id,
                quantity: 0,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let short = order_service::checkout(
        &state,
        &shopper,
        CheckoutRequest {
            items: vec![
                CheckoutLine {
                    product_id: bulk.id,
                    quantity: 2,
                },
                CheckoutLine {
                    product_id: product_a.id,
                    quantity: 1,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(short.orders.len(), 1);
    assert_eq!(short.orders[0].order.vendor_id, vendor_a);
    assert_eq!(short.failures.len(), 1);
    assert_eq!(short.failures[0].vendor_id, vendor_b);
    assert!(short.failures[0].error.contains("minimum quantity"));

    // --- Status workflow on vendor A's order ---

    let order_id = order_a.order.id;
    let vendor = acting_as(vendor_a, Role::Vendor);

    let accepted = order_service::update_status(
        &state,
        &vendor,
        OrderActor::Vendor,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Accepted,
            expected_status: OrderStatus::Pending,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(accepted.order.status, OrderStatus::Accepted);
    assert!(
        accepted
            .order
            .vendor_comment
            .contains("Order status changed to accepted by vendor")
    );

    // `accepted` is not a customer-reachable target status.
    let err = order_service::update_status(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Accepted,
            expected_status: OrderStatus::Accepted,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // A stale observed status is a conflict, never a silent overwrite.
    let err = order_service::update_status(
        &state,
        &vendor,
        OrderActor::Vendor,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
            expected_status: OrderStatus::Pending,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict));

    // A stranger to the order is rejected on ownership, not the table.
    let err = order_service::update_status(
        &state,
        &acting_as(vendor_b, Role::Vendor),
        OrderActor::Vendor,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Completed,
            expected_status: OrderStatus::Accepted,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Customer cancels from accepted; vendor reopens; customer cancels
    // again and then archives via the idempotent re-cancel.
    let cancelled = order_service::update_status(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
            expected_status: OrderStatus::Accepted,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert!(!cancelled.order.archived);

    let reopened = order_service::update_status(
        &state,
        &vendor,
        OrderActor::Vendor,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Accepted,
            expected_status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(reopened.order.status, OrderStatus::Accepted);

    order_service::update_status(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
            expected_status: OrderStatus::Accepted,
        },
    )
    .await?;
    let archived = order_service::update_status(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
            expected_status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(archived.order.archived);
    assert_eq!(archived.order.total_cents, 2 * 1000, "archiving must not touch the total");
    assert_eq!(archived.items.len(), 1, "archiving must not touch line items");

    // --- Comments are append-only logs ---

    order_service::update_comment(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderCommentRequest {
            comment: "please ring the bell".into(),
        },
    )
    .await?;
    let commented = order_service::update_comment(
        &state,
        &shopper,
        OrderActor::Customer,
        order_id,
        UpdateOrderCommentRequest {
            comment: "leave at the door".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let bell = commented.order.customer_comment.find("please ring the bell");
    let door = commented.order.customer_comment.find("leave at the door");
    assert!(bell.is_some() && door.is_some() && bell < door);

    // --- Listings are scoped by role and by party ---

    let as_customer = order_service::list_customer_orders(&state, &shopper)
        .await?
        .data
        .unwrap();
    assert_eq!(as_customer.items.len(), 3);

    // Orders placed as `customer` stay invisible under the B2B role.
    let as_b2b =
        order_service::list_customer_orders(&state, &acting_as(customer, Role::B2bCustomer))
            .await?
            .data
            .unwrap();
    assert!(as_b2b.items.is_empty());

    let vendor_orders = order_service::list_vendor_orders(&state, &vendor)
        .await?
        .data
        .unwrap();
    assert!(vendor_orders.items.iter().any(|o| o.id == order_id));

    // A B2B checkout totals at the B2B price and records the role.
    let b2b_report = order_service::checkout(
        &state,
        &acting_as(customer, Role::B2bCustomer),
        CheckoutRequest {
            items: vec![CheckoutLine {
                product_id: product_b.id,
                quantity: 4,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(b2b_report.orders.len(), 1);
    assert_eq!(b2b_report.orders[0].order.total_cents, 4 * 400);
    assert_eq!(b2b_report.orders[0].order.placed_as, Role::B2bCustomer);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    sqlx::query(
        "TRUNCATE TABLE order_items, orders, products, user_roles, audit_logs, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    Ok(AppState {
        pool,
        orm,
        jwt: JwtKeys::from_secret("integration-test-secret"),
    })
}

async fn create_user(state: &AppState, email: &str, roles: &[Role]) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, active_role, email_verified)
         VALUES ($1, $2, 'dummy', $3, TRUE)",
    )
    .bind(id)
    .bind(email)
    .bind(roles[0].as_str())
    .execute(&state.pool)
    .await?;

    for role in roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(id)
            .bind(role.as_str())
            .execute(&state.pool)
            .await?;
    }
    Ok(id)
}

fn acting_as(user_id: Uuid, role: Role) -> AuthUser {
    AuthUser { user_id, role }
}

fn product_request(sku: &str, name: &str, retail: i64, b2b: i64) -> CreateProductRequest {
    CreateProductRequest {
        sku: sku.into(),
        name: name.into(),
        description: Some("integration test product".into()),
        category: "produce".into(),
        stock: 10,
        retail_price_cents: retail,
        b2b_price_cents: b2b,
        paid_cost_cents: b2b * 8 / 10,
        allow_loose: false,
        min_quantity: 1,
        image_url: None,
    }
}
