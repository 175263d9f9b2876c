//! The order lifecycle service.
//!
//! Every workflow here runs its multi-row mutations inside one sqlx
//! transaction: stock decrements, order/line inserts, cart removal, and
//! the idempotency-key record either all commit or all roll back. Stock
//! is taken with conditional updates, so two concurrent checkouts racing
//! for the last unit resolve inside Postgres rather than here.
//!
//! Emails and notification rows are post-commit side effects: spawned,
//! logged on failure, never allowed to fail the request.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use copperleaf_core::{
    CancellationSource, CancellationState, NotificationKind, OrderId, OrderStatus,
    OrderStatusTarget, ProductId, UserId,
};

use crate::db::{
    self, RepositoryError, UserRepository,
    notifications::{CreateNotification, NotificationRepository},
    orders::{CreateOrder, NewOrderItem},
};
use crate::error::{AppError, Result};
use crate::models::{DeliveryAddress, Order, OrderItem};
use crate::services::EmailService;

/// Post-decrement stock level at or below which the admin gets an alert.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Default delivery estimate window.
const ESTIMATED_DELIVERY_DAYS: i64 = 7;

/// One requested order line.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    pub items: Vec<OrderLineInput>,
    pub delivery_address: DeliveryAddress,
    /// When true, only the purchased (product, size, color) cart lines are
    /// removed; the rest of the cart survives.
    #[serde(default)]
    pub partial_checkout: bool,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// An order with its lines, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// What a status update ended up doing.
#[derive(Debug)]
pub enum StatusUpdate {
    /// Plain forward move to the new status.
    Moved(OrderStatus),
    /// Pending cancellation request approved; order archived.
    RequestApproved,
    /// Pending cancellation request declined; order continues.
    RequestRejected,
    /// Admin cancelled an order that had no pending request.
    Cancelled,
}

/// Per-order outcome of a bulk status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkUpdateOutcome {
    Updated,
    NotFound,
    /// Skipped: the bulk path carries no approve/reject semantics, so an
    /// order with an unreviewed cancellation request is left untouched.
    RequestPending,
    /// Skipped: the move would not be a forward transition.
    InvalidTransition,
}

/// Per-order outcome of a bulk cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkCancelOutcome {
    Cancelled,
    NotFound,
    /// Only Pending orders are bulk-cancellable.
    NotPending,
}

/// One row of a bulk operation report.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome<T> {
    pub id: OrderId,
    pub outcome: T,
}

/// Orchestrates checkout, status transitions, and the cancellation
/// workflows.
#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    mailer: Option<EmailService>,
    admin_email: String,
}

impl OrderService {
    #[must_use]
    pub const fn new(pool: PgPool, mailer: Option<EmailService>, admin_email: String) -> Self {
        Self {
            pool,
            mailer,
            admin_email,
        }
    }

    // ------------------------------------------------------------------
    // Checkout
    // ------------------------------------------------------------------

    /// Place an order: reserve stock, snapshot lines, clean the cart.
    ///
    /// # Errors
    ///
    /// `Conflict` for unverified accounts, duplicate orders inside the
    /// cooldown window, and stock shortfalls; `NotFound` for missing
    /// products or variants; `Validation` for malformed input.
    pub async fn place_order(
        &self,
        user_id: UserId,
        input: PlaceOrderInput,
    ) -> Result<OrderDetail> {
        if input.items.is_empty() {
            return Err(AppError::Validation("Order must contain at least one item".to_owned()));
        }
        if input.items.iter().any(|line| line.quantity < 1) {
            return Err(AppError::Validation("Item quantity must be at least 1".to_owned()));
        }

        let user = UserRepository::new(&self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;
        if !user.is_verified {
            return Err(AppError::Conflict(
                "Please verify your account before placing orders".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Replay guard: a key we have seen returns the original order.
        if let Some(key) = input.idempotency_key.as_deref()
            && let Some(existing_id) =
                db::orders::find_order_by_idempotency_key(&mut tx, user_id, key).await?
        {
            let order = db::orders::get_order(&mut *tx, existing_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
            let items = db::orders::get_order_items(&mut *tx, existing_id).await?;
            return Ok(OrderDetail { order, items });
        }

        // Without a key, fall back to the time-window duplicate guard.
        if input.idempotency_key.is_none() {
            let product_ids: Vec<_> = input.items.iter().map(|l| l.product_id).collect();
            if let Some(dup) =
                db::orders::find_duplicate_order(&mut tx, user_id, &product_ids).await?
            {
                tracing::info!(user_id = %user_id, duplicate_of = %dup, "Duplicate order rejected");
                return Err(AppError::Conflict(
                    "A similar order was placed in the last few minutes. \
                     Please wait before ordering again."
                        .to_owned(),
                ));
            }
        }

        let mut snapshots = Vec::with_capacity(input.items.len());
        let mut low_stock = Vec::new();
        let mut purchased_keys = Vec::with_capacity(input.items.len());

        for line in &input.items {
            let product = db::products::get_product(&mut tx, line.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Product {} not found", line.product_id))
                })?;

            let size = line.size.clone().unwrap_or_default();
            let color = line.color.clone().unwrap_or_default();

            if product.has_variants {
                let taken = db::products::try_decrement_variant_stock(
                    &mut tx,
                    product.id,
                    &size,
                    &color,
                    line.quantity,
                )
                .await?;
                if taken.is_none() {
                    // Missing variant and shortfall both match no row;
                    // a follow-up read tells them apart.
                    return match db::products::variant_stock(&mut tx, product.id, &size, &color)
                        .await?
                    {
                        None => Err(AppError::NotFound(format!(
                            "Variant not available for {}",
                            product.name
                        ))),
                        Some(left) => {
                            Err(AppError::Conflict(out_of_stock_message(&product.name, left)))
                        }
                    };
                }
            }

            let remaining =
                db::products::try_decrement_stock(&mut tx, product.id, line.quantity).await?;
            let Some(remaining) = remaining else {
                return Err(AppError::Conflict(out_of_stock_message(
                    &product.name,
                    product.stock,
                )));
            };

            if remaining <= LOW_STOCK_THRESHOLD {
                low_stock.push((product.name.clone(), remaining));
            }

            snapshots.push(NewOrderItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                image_url: product.image_url.clone(),
                quantity: line.quantity,
                size: size.clone(),
                color: color.clone(),
            });
            purchased_keys.push((product.id, size, color));
        }

        let total = order_total(&snapshots);

        let order = db::orders::create_order(
            &mut tx,
            &CreateOrder {
                user_id,
                total_amount: total,
                delivery_address: input.delivery_address.clone(),
                estimated_delivery: Some(Utc::now() + Duration::days(ESTIMATED_DELIVERY_DAYS)),
                items: snapshots,
            },
        )
        .await?;

        if input.partial_checkout {
            db::carts::remove_purchased(&mut tx, user_id, &purchased_keys).await?;
        } else {
            db::carts::clear_cart(&mut tx, user_id).await?;
        }

        if let Some(key) = input.idempotency_key.as_deref() {
            db::orders::record_idempotency_key(&mut tx, user_id, key, order.id).await?;
        }

        tx.commit().await?;

        let items = db::orders::get_order_items(&self.pool, order.id).await?;

        tracing::info!(order_id = %order.id, user_id = %user_id, total = %total, "Order placed");
        self.spawn_placed_side_effects(&order, user.email.clone(), items.len(), low_stock);

        Ok(OrderDetail { order, items })
    }

    // ------------------------------------------------------------------
    // Status transitions (admin)
    // ------------------------------------------------------------------

    /// Apply a status change; resolves a pending cancellation request when
    /// one is attached.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `Conflict` for a non-forward move
    /// or a transition blocked by an unreviewed request.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        target: OrderStatusTarget,
        admin_reason: Option<String>,
    ) -> Result<StatusUpdate> {
        let mut tx = self.pool.begin().await?;

        let order = db::orders::get_order(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        let plan = resolve_transition(order.status, order.cancellation.is_requested(), target)?;

        let outcome = match plan {
            TransitionPlan::ApproveCancellation => {
                let reason = match &order.cancellation.0 {
                    CancellationState::Requested { reason, .. } => Some(reason.clone()),
                    _ => None,
                };
                self.archive_in_tx(
                    &mut tx,
                    &order,
                    CancellationSource::UserRequestedApproved,
                    reason.as_deref(),
                    admin_reason.as_deref(),
                )
                .await?;
                tx.commit().await?;

                self.spawn_cancelled_side_effects(
                    &order,
                    "Your cancellation request was approved and the order has been cancelled."
                        .to_owned(),
                );
                StatusUpdate::RequestApproved
            }

            TransitionPlan::RejectRequest => {
                let reason = match &order.cancellation.0 {
                    CancellationState::Requested { reason, .. } => reason.clone(),
                    _ => String::new(),
                };
                let admin_reason =
                    admin_reason.unwrap_or_else(|| "Request declined".to_owned());
                db::orders::set_cancellation(
                    &mut tx,
                    order.id,
                    &CancellationState::Rejected {
                        reason,
                        admin_reason: admin_reason.clone(),
                        reviewed_at: Utc::now(),
                    },
                )
                .await?;
                tx.commit().await?;

                self.spawn_status_side_effects(
                    &order,
                    format!("Your cancellation request was declined: {admin_reason}"),
                );
                StatusUpdate::RequestRejected
            }

            TransitionPlan::AdminCancel => {
                self.archive_in_tx(
                    &mut tx,
                    &order,
                    CancellationSource::AdminCancelled,
                    None,
                    admin_reason.as_deref(),
                )
                .await?;
                tx.commit().await?;

                self.spawn_cancelled_side_effects(
                    &order,
                    "Your order was cancelled by the store.".to_owned(),
                );
                StatusUpdate::Cancelled
            }

            TransitionPlan::Move(status) => {
                db::orders::update_order_status(&mut tx, order.id, status).await?;
                tx.commit().await?;

                self.spawn_status_side_effects(&order, format!("Your order is now {status}."));
                StatusUpdate::Moved(status)
            }
        };

        tracing::info!(order_id = %order_id, new_status = %target, "Order status updated");
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Cancellation (user)
    // ------------------------------------------------------------------

    /// Cancel the caller's own Pending order.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign order; `Conflict` once the
    /// order has moved past Pending.
    pub async fn cancel_by_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let order = db::orders::get_order(&mut *tx, order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        check_user_cancel(order.status)?;

        self.archive_in_tx(
            &mut tx,
            &order,
            CancellationSource::UserCancelled,
            reason.as_deref(),
            None,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, user_id = %user_id, "Order cancelled by user");
        self.spawn_cancelled_side_effects(&order, "You cancelled this order.".to_owned());
        Ok(())
    }

    /// File a cancellation request against the caller's Processing order.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign order; `Conflict` when the
    /// order is not Processing or a request is already pending.
    pub async fn request_cancellation(
        &self,
        user_id: UserId,
        order_id: OrderId,
        reason: String,
    ) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "A reason is required to request cancellation".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let order = db::orders::get_order(&mut *tx, order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        check_cancellation_request(order.status, order.cancellation.is_requested())?;

        db::orders::set_cancellation(
            &mut tx,
            order.id,
            &CancellationState::Requested {
                reason: reason.clone(),
                requested_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, user_id = %user_id, "Cancellation requested");
        self.spawn_request_side_effects(&order, reason);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bulk (admin)
    // ------------------------------------------------------------------

    /// Move a batch of orders to `target`, one at a time, reporting a
    /// per-order outcome.
    ///
    /// # Errors
    ///
    /// `Validation` when `target` is `Cancelled` (use bulk cancel);
    /// database errors abort the remainder of the batch.
    pub async fn bulk_update_status(
        &self,
        ids: &[OrderId],
        target: OrderStatusTarget,
    ) -> Result<Vec<BulkOutcome<BulkUpdateOutcome>>> {
        let Some(status) = target.as_status() else {
            return Err(AppError::Validation(
                "Bulk status updates cannot cancel orders".to_owned(),
            ));
        };

        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let outcome = self.bulk_update_one(id, status).await?;
            outcomes.push(BulkOutcome { id, outcome });
        }
        Ok(outcomes)
    }

    async fn bulk_update_one(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<BulkUpdateOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(order) = db::orders::get_order(&mut *tx, id).await? else {
            return Ok(BulkUpdateOutcome::NotFound);
        };
        if order.cancellation.is_requested() {
            return Ok(BulkUpdateOutcome::RequestPending);
        }
        if !order.status.can_transition_to(status) {
            return Ok(BulkUpdateOutcome::InvalidTransition);
        }

        db::orders::update_order_status(&mut tx, id, status).await?;
        tx.commit().await?;

        self.spawn_status_side_effects(&order, format!("Your order is now {status}."));
        Ok(BulkUpdateOutcome::Updated)
    }

    /// Cancel a batch of Pending orders, reporting a per-order outcome
    /// instead of silently skipping ineligible ones.
    ///
    /// # Errors
    ///
    /// Database errors abort the remainder of the batch.
    pub async fn bulk_cancel(
        &self,
        ids: &[OrderId],
        admin_reason: Option<&str>,
    ) -> Result<Vec<BulkOutcome<BulkCancelOutcome>>> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let outcome = self.bulk_cancel_one(id, admin_reason).await?;
            outcomes.push(BulkOutcome { id, outcome });
        }
        Ok(outcomes)
    }

    async fn bulk_cancel_one(
        &self,
        id: OrderId,
        admin_reason: Option<&str>,
    ) -> Result<BulkCancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(order) = db::orders::get_order(&mut *tx, id).await? else {
            return Ok(BulkCancelOutcome::NotFound);
        };
        if order.status != OrderStatus::Pending {
            return Ok(BulkCancelOutcome::NotPending);
        }

        self.archive_in_tx(
            &mut tx,
            &order,
            CancellationSource::AdminCancelled,
            None,
            admin_reason,
        )
        .await?;
        tx.commit().await?;

        self.spawn_cancelled_side_effects(
            &order,
            "Your order was cancelled by the store.".to_owned(),
        );
        Ok(BulkCancelOutcome::Cancelled)
    }

    // ------------------------------------------------------------------
    // Shared termination path
    // ------------------------------------------------------------------

    /// Archive + stock restore + live-row delete, inside the caller's
    /// transaction. The archive insert and the delete keep the live table
    /// and the archive mutually exclusive.
    async fn archive_in_tx(
        &self,
        tx: &mut PgConnection,
        order: &Order,
        source: CancellationSource,
        reason: Option<&str>,
        admin_reason: Option<&str>,
    ) -> Result<()> {
        let items = db::orders::get_order_items(&mut *tx, order.id).await?;
        restore_order_lines(tx, &items).await?;
        db::cancelled_orders::archive_order(tx, order, &items, source, reason, admin_reason)
            .await?;
        db::orders::delete_order(tx, order.id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Post-commit side effects
    // ------------------------------------------------------------------

    fn spawn_placed_side_effects(
        &self,
        order: &Order,
        buyer_email: String,
        item_count: usize,
        low_stock: Vec<(String, i32)>,
    ) {
        let pool = self.pool.clone();
        let mailer = self.mailer.clone();
        let admin_email = self.admin_email.clone();
        let order_id = order.id;
        let user_id = order.user_id;
        let total = order.total_amount.to_string();

        tokio::spawn(async move {
            if let Some(mailer) = &mailer {
                if let Err(e) = mailer
                    .send_order_confirmation(&buyer_email, order_id, &total, item_count)
                    .await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Buyer confirmation email failed");
                }
                if let Err(e) = mailer
                    .send_order_confirmation(&admin_email, order_id, &total, item_count)
                    .await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Admin confirmation email failed");
                }
                for (name, remaining) in &low_stock {
                    if let Err(e) = mailer
                        .send_low_stock_alert(&admin_email, name, *remaining)
                        .await
                    {
                        tracing::warn!(product = %name, error = %e, "Low stock alert failed");
                    }
                }
            }

            write_notification(
                &pool,
                user_id,
                order_id,
                "Order Placed".to_owned(),
                format!("Order #{order_id} has been placed."),
            )
            .await;
        });
    }

    fn spawn_status_side_effects(&self, order: &Order, detail: String) {
        let pool = self.pool.clone();
        let mailer = self.mailer.clone();
        let order_id = order.id;
        let user_id = order.user_id;

        tokio::spawn(async move {
            if let Some(mailer) = &mailer
                && let Some(email) = user_email(&pool, user_id).await
                && let Err(e) = mailer.send_status_update(&email, order_id, &detail).await
            {
                tracing::warn!(order_id = %order_id, error = %e, "Status email failed");
            }
            write_notification(
                &pool,
                user_id,
                order_id,
                "Order Update".to_owned(),
                detail,
            )
            .await;
        });
    }

    fn spawn_cancelled_side_effects(&self, order: &Order, detail: String) {
        let pool = self.pool.clone();
        let mailer = self.mailer.clone();
        let admin_email = self.admin_email.clone();
        let order_id = order.id;
        let user_id = order.user_id;

        tokio::spawn(async move {
            if let Some(mailer) = &mailer {
                if let Some(email) = user_email(&pool, user_id).await
                    && let Err(e) = mailer.send_order_cancelled(&email, order_id, &detail).await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Cancellation email failed");
                }
                if let Err(e) = mailer
                    .send_order_cancelled(&admin_email, order_id, &detail)
                    .await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Admin cancellation email failed");
                }
            }
            write_notification(
                &pool,
                user_id,
                order_id,
                "Order Cancelled".to_owned(),
                format!("Order #{order_id} has been cancelled."),
            )
            .await;
        });
    }

    fn spawn_request_side_effects(&self, order: &Order, reason: String) {
        let pool = self.pool.clone();
        let mailer = self.mailer.clone();
        let admin_email = self.admin_email.clone();
        let order_id = order.id;
        let user_id = order.user_id;

        tokio::spawn(async move {
            if let Some(mailer) = &mailer {
                if let Some(email) = user_email(&pool, user_id).await
                    && let Err(e) = mailer
                        .send_cancellation_request(&email, order_id, &reason)
                        .await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Request ack email failed");
                }
                if let Err(e) = mailer
                    .send_cancellation_request(&admin_email, order_id, &reason)
                    .await
                {
                    tracing::warn!(order_id = %order_id, error = %e, "Admin request email failed");
                }
            }
            write_notification(
                &pool,
                user_id,
                order_id,
                "Cancellation Requested".to_owned(),
                format!("Your cancellation request for order #{order_id} is under review."),
            )
            .await;
        });
    }
}

/// What a status-update request resolves to, given the order's current
/// status and whether a cancellation request is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionPlan {
    ApproveCancellation,
    RejectRequest,
    AdminCancel,
    Move(OrderStatus),
}

/// Pure decision function behind [`OrderService::update_status`].
///
/// While a cancellation request is pending, only two moves resolve it:
/// `Cancelled` approves, `Processing` rejects. Anything else is refused so
/// the request is never silently outrun by a shipment.
fn resolve_transition(
    current: OrderStatus,
    request_pending: bool,
    target: OrderStatusTarget,
) -> Result<TransitionPlan> {
    if request_pending {
        return match target {
            OrderStatusTarget::Cancelled => Ok(TransitionPlan::ApproveCancellation),
            OrderStatusTarget::Processing => Ok(TransitionPlan::RejectRequest),
            OrderStatusTarget::Shipped | OrderStatusTarget::Delivered => {
                Err(AppError::Conflict(
                    "Resolve the pending cancellation request before moving this order"
                        .to_owned(),
                ))
            }
        };
    }

    match target.as_status() {
        None => Ok(TransitionPlan::AdminCancel),
        Some(next) if current.can_transition_to(next) => Ok(TransitionPlan::Move(next)),
        Some(_) => Err(AppError::Conflict(format!(
            "Cannot move order from {current} to {target}"
        ))),
    }
}

/// Gate behind [`OrderService::cancel_by_user`]: owners may only cancel
/// an order that is still `Pending`.
fn check_user_cancel(status: OrderStatus) -> Result<()> {
    if status == OrderStatus::Pending {
        Ok(())
    } else {
        Err(AppError::Conflict(
            "Cannot cancel an order that is already processed".to_owned(),
        ))
    }
}

/// Gate behind [`OrderService::request_cancellation`]: requests are only
/// accepted against a `Processing` order with no unreviewed request.
fn check_cancellation_request(status: OrderStatus, request_pending: bool) -> Result<()> {
    if status != OrderStatus::Processing {
        return Err(AppError::Conflict(
            "Cancellation requests are only accepted while an order is Processing".to_owned(),
        ));
    }
    if request_pending {
        return Err(AppError::Conflict(
            "A cancellation request is already pending for this order".to_owned(),
        ));
    }
    Ok(())
}

/// Sum of price x quantity over the snapshotted lines.
fn order_total(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

fn out_of_stock_message(name: &str, remaining: i32) -> String {
    format!("{name} is Out of Stock: {remaining} left")
}

/// One stock-restoration step derived from an archived line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RestockStep {
    Variant {
        product_id: ProductId,
        size: String,
        color: String,
        quantity: i32,
    },
    Aggregate {
        product_id: ProductId,
        quantity: i32,
    },
}

/// Turn archived lines into restoration steps, mirroring the checkout
/// decrements: a plain line restores the aggregate, a variant line
/// restores the variant row and the aggregate with the same quantity.
fn restock_plan(items: &[OrderItem]) -> Vec<RestockStep> {
    let mut plan = Vec::with_capacity(items.len());
    for item in items {
        if !item.size.is_empty() || !item.color.is_empty() {
            plan.push(RestockStep::Variant {
                product_id: item.product_id,
                size: item.size.clone(),
                color: item.color.clone(),
                quantity: item.quantity,
            });
        }
        plan.push(RestockStep::Aggregate {
            product_id: item.product_id,
            quantity: item.quantity,
        });
    }
    plan
}

/// Put every line's units back, variant row and aggregate together.
///
/// A line whose (size, color) no longer matches a variant still restores
/// the aggregate; the mismatch is logged rather than dropped.
async fn restore_order_lines(
    conn: &mut PgConnection,
    items: &[OrderItem],
) -> std::result::Result<(), RepositoryError> {
    for step in restock_plan(items) {
        match step {
            RestockStep::Variant {
                product_id,
                size,
                color,
                quantity,
            } => {
                let matched =
                    db::products::restore_variant_stock(conn, product_id, &size, &color, quantity)
                        .await?;
                if !matched {
                    tracing::warn!(
                        product_id = %product_id,
                        size = %size,
                        color = %color,
                        "No matching variant on restore; aggregate restored only"
                    );
                }
            }
            RestockStep::Aggregate {
                product_id,
                quantity,
            } => {
                let exists = db::products::restore_stock(conn, product_id, quantity).await?;
                if !exists {
                    tracing::warn!(product_id = %product_id, "Product gone; stock restore skipped");
                }
            }
        }
    }
    Ok(())
}

async fn user_email(pool: &PgPool, user_id: UserId) -> Option<String> {
    match UserRepository::new(pool).get_by_id(user_id).await {
        Ok(Some(user)) => Some(user.email),
        Ok(None) => {
            tracing::warn!(user_id = %user_id, "User missing for email side effect");
            None
        }
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "User lookup failed for email");
            None
        }
    }
}

async fn write_notification(
    pool: &PgPool,
    user_id: UserId,
    order_id: OrderId,
    title: String,
    message: String,
) {
    let result = NotificationRepository::new(pool)
        .create(&CreateNotification {
            user_id,
            title,
            message,
            kind: NotificationKind::Order,
            link: Some(format!("/orders/{order_id}")),
            order_id: Some(order_id),
            priority: 3,
        })
        .await;

    if let Err(e) = result {
        tracing::warn!(order_id = %order_id, error = %e, "Notification write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperleaf_core::{OrderItemId, ProductId};

    fn line(price: i64, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(1),
            name: "Linen Shirt".to_owned(),
            price: Decimal::from(price),
            image_url: None,
            quantity,
            size: String::new(),
            color: String::new(),
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let items = vec![line(100, 2), line(50, 3)];
        assert_eq!(order_total(&items), Decimal::from(350));
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn out_of_stock_message_reports_remaining() {
        let msg = out_of_stock_message("Linen Shirt", 3);
        assert!(msg.contains("Out of Stock"));
        assert!(msg.contains("3 left"));
        assert!(msg.contains("Linen Shirt"));
    }

    #[test]
    fn plain_transitions_move_forward_only() {
        use OrderStatus::{Pending, Processing, Shipped};

        assert_eq!(
            resolve_transition(Pending, false, OrderStatusTarget::Processing).unwrap(),
            TransitionPlan::Move(Processing)
        );
        // Skipping ahead is allowed.
        assert_eq!(
            resolve_transition(Pending, false, OrderStatusTarget::Delivered).unwrap(),
            TransitionPlan::Move(OrderStatus::Delivered)
        );
        // Regression and self-moves are not.
        assert!(matches!(
            resolve_transition(Shipped, false, OrderStatusTarget::Processing),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            resolve_transition(Processing, false, OrderStatusTarget::Processing),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn cancelled_target_without_request_is_admin_cancel() {
        assert_eq!(
            resolve_transition(OrderStatus::Pending, false, OrderStatusTarget::Cancelled).unwrap(),
            TransitionPlan::AdminCancel
        );
    }

    #[test]
    fn pending_request_resolves_to_approve_or_reject() {
        let current = OrderStatus::Processing;

        assert_eq!(
            resolve_transition(current, true, OrderStatusTarget::Cancelled).unwrap(),
            TransitionPlan::ApproveCancellation
        );
        assert_eq!(
            resolve_transition(current, true, OrderStatusTarget::Processing).unwrap(),
            TransitionPlan::RejectRequest
        );
        // Shipping past an unreviewed request is refused.
        assert!(matches!(
            resolve_transition(current, true, OrderStatusTarget::Shipped),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            resolve_transition(current, true, OrderStatusTarget::Delivered),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn low_stock_alert_fires_at_threshold_and_below() {
        let alerted: Vec<i32> = [12, 6, 5, 4, 0]
            .into_iter()
            .filter(|remaining| *remaining <= LOW_STOCK_THRESHOLD)
            .collect();
        assert_eq!(alerted, vec![5, 4, 0]);
    }

    #[test]
    fn user_cancel_is_gated_to_pending() {
        use OrderStatus::{Delivered, Pending, Processing, Shipped};

        assert!(check_user_cancel(Pending).is_ok());
        for status in [Processing, Shipped, Delivered] {
            assert!(matches!(
                check_user_cancel(status),
                Err(AppError::Conflict(_))
            ));
        }
    }

    #[test]
    fn cancellation_request_is_gated_to_processing() {
        use OrderStatus::{Delivered, Pending, Processing, Shipped};

        assert!(check_cancellation_request(Processing, false).is_ok());
        // A Pending order is cancelled directly, not via request.
        for status in [Pending, Shipped, Delivered] {
            assert!(matches!(
                check_cancellation_request(status, false),
                Err(AppError::Conflict(_))
            ));
        }
    }

    #[test]
    fn second_cancellation_request_is_refused() {
        assert!(matches!(
            check_cancellation_request(OrderStatus::Processing, true),
            Err(AppError::Conflict(_))
        ));
    }

    fn archived_line(product: i32, size: &str, color: &str, quantity: i32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(product),
            name: "Linen Shirt".to_owned(),
            price: Decimal::from(100),
            image_url: None,
            quantity,
            size: size.to_owned(),
            color: color.to_owned(),
        }
    }

    #[test]
    fn restock_plan_mirrors_the_checkout_decrements() {
        let items = vec![archived_line(1, "", "", 2), archived_line(2, "M", "Blue", 3)];

        assert_eq!(
            restock_plan(&items),
            vec![
                RestockStep::Aggregate {
                    product_id: ProductId::new(1),
                    quantity: 2,
                },
                RestockStep::Variant {
                    product_id: ProductId::new(2),
                    size: "M".to_owned(),
                    color: "Blue".to_owned(),
                    quantity: 3,
                },
                RestockStep::Aggregate {
                    product_id: ProductId::new(2),
                    quantity: 3,
                },
            ]
        );
    }

    #[test]
    fn restock_plan_restores_each_unit_exactly_once_per_dimension() {
        let items = vec![archived_line(7, "L", "Black", 4)];
        let plan = restock_plan(&items);

        let aggregate_total: i32 = plan
            .iter()
            .map(|step| match step {
                RestockStep::Aggregate { quantity, .. } => *quantity,
                RestockStep::Variant { .. } => 0,
            })
            .sum();
        let variant_total: i32 = plan
            .iter()
            .map(|step| match step {
                RestockStep::Variant { quantity, .. } => *quantity,
                RestockStep::Aggregate { .. } => 0,
            })
            .sum();

        assert_eq!(aggregate_total, 4);
        assert_eq!(variant_total, 4);
    }
}
