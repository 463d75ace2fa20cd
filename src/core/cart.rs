//! Cart and checkout workflow.
//!
//! A [`Cart`] accumulates lines for one seller against the stock currently in
//! the catalog, then commits them as a single unit of work: every line is
//! re-read, re-checked, recorded as a sale at the commit-time price and
//! subtracted from stock inside one transaction. If any line fails, nothing is
//! written, the cart keeps its lines and moves to [`CheckoutState::Failed`].
//!
//! The cart holds at most one line per product; adding a product again merges
//! into its existing line.

use crate::{
    core::{
        events::{InventoryEvent, InventoryEvents},
        product, sale,
    },
    entities::Product,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Handle to one cart line, stable until the line is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A product and quantity pending sale.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Handle for [`Cart::remove_line`]
    pub id: LineId,
    /// Product being sold
    pub product_id: i64,
    /// Product name when the line was last touched
    pub product_name: String,
    /// Unit price when the line was last touched; commit uses the live price
    pub unit_price: f64,
    /// Units in the cart
    pub quantity: i32,
}

impl CartLine {
    /// `unit_price * quantity`
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Where a cart is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No lines, nothing happened yet
    Empty,
    /// At least one line added since the last commit or cancel
    Accumulating,
    /// A commit is writing
    Committing,
    /// The last commit succeeded; the cart is empty
    Committed,
    /// The last commit was rolled back; lines are kept
    Failed,
    /// An active session was discarded by [`Cart::cancel`]
    Cancelled,
}

/// What a successful checkout wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    /// New sale rows, in cart order
    pub sale_ids: Vec<i64>,
    /// Revenue at commit-time prices
    pub total: f64,
}

/// In-memory checkout session for one seller.
#[derive(Debug)]
pub struct Cart {
    user_id: i64,
    lines: Vec<CartLine>,
    next_line_id: u64,
    state: CheckoutState,
    events: Option<InventoryEvents>,
}

impl Cart {
    /// An empty cart whose sales are attributed to `user_id`.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            next_line_id: 1,
            state: CheckoutState::Empty,
            events: None,
        }
    }

    /// Publishes [`InventoryEvent::StockChanged`] to `events` after each commit.
    #[must_use]
    pub fn with_events(mut self, events: InventoryEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Seller the sales will be recorded for.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Units of `product_id` currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: i64) -> i32 {
        self.lines
            .iter()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .sum()
    }

    /// Adds `quantity` units of a product, checked against its current stock.
    ///
    /// The product is read from the store on every call. When the product is
    /// already in the cart its line grows and takes the fresh name and price.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `quantity` is below 1
    /// - The product does not exist
    /// - Units already in the cart plus `quantity` exceed stock on hand
    /// - The database read fails
    ///
    /// On error the cart is unchanged.
    #[instrument(skip(self, db), fields(user_id = self.user_id))]
    pub async fn add_line(
        &mut self,
        db: &DatabaseConnection,
        product_id: i64,
        quantity: i32,
    ) -> Result<LineId> {
        if quantity < 1 {
            return Err(Error::validation(format!(
                "Quantity must be at least 1, got {quantity}"
            )));
        }

        let product = product::get_product_by_id(db, product_id)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;

        let already_in_cart = self.quantity_of(product_id);
        let requested = already_in_cart.saturating_add(quantity);
        if requested > product.quantity {
            return Err(Error::InsufficientStock {
                product: product.name,
                available: product.quantity,
                requested,
            });
        }

        self.state = CheckoutState::Accumulating;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = requested;
            line.product_name = product.name;
            line.unit_price = product.price;
            debug!(line_id = %line.id, quantity = line.quantity, "Merged into cart line");
            return Ok(line.id);
        }

        let id = LineId(self.next_line_id);
        self.next_line_id += 1;
        self.lines.push(CartLine {
            id,
            product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity,
        });
        debug!(line_id = %id, "Added cart line");
        Ok(id)
    }

    /// Removes one line and returns it.
    ///
    /// # Errors
    /// Returns `Error::CartLineNotFound` for an unknown handle.
    pub fn remove_line(&mut self, line_id: LineId) -> Result<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or(Error::CartLineNotFound { line_id: line_id.0 })?;
        let removed = self.lines.remove(index);
        if self.lines.is_empty() {
            self.state = CheckoutState::Empty;
        }
        Ok(removed)
    }

    /// Discards every line.
    ///
    /// An `Accumulating` or `Failed` session ends in `Cancelled`; any other
    /// cart has nothing to cancel and returns to `Empty`. Either way the next
    /// [`Cart::add_line`] starts from a clean cart.
    pub fn cancel(&mut self) {
        self.lines.clear();
        self.state = match self.state {
            CheckoutState::Accumulating | CheckoutState::Failed => CheckoutState::Cancelled,
            _ => CheckoutState::Empty,
        };
    }

    /// Records every line as a sale and decrements stock, all or nothing.
    ///
    /// Lines are processed in cart order. Each product is re-read inside the
    /// transaction and its price at that moment becomes the sale's unit price.
    ///
    /// # Errors
    /// Returns an error if the cart is empty, a product disappeared, stock no
    /// longer covers a line, or the store fails. In every case the
    /// transaction is rolled back and the cart keeps its lines.
    #[instrument(skip(self, db), fields(user_id = self.user_id, lines = self.lines.len()))]
    pub async fn commit(&mut self, db: &DatabaseConnection) -> Result<CheckoutReceipt> {
        if self.lines.is_empty() {
            return Err(Error::validation("Cannot check out an empty cart"));
        }

        self.state = CheckoutState::Committing;
        match self.write_sales(db).await {
            Ok(receipt) => {
                let product_ids = self.lines.iter().map(|line| line.product_id).collect();
                self.lines.clear();
                self.state = CheckoutState::Committed;
                info!(
                    sales = receipt.sale_ids.len(),
                    total = receipt.total,
                    "Checkout committed"
                );
                if let Some(events) = &self.events {
                    events.publish(InventoryEvent::StockChanged { product_ids });
                }
                Ok(receipt)
            }
            Err(e) => {
                self.state = CheckoutState::Failed;
                warn!("Checkout rolled back: {}", e);
                Err(e)
            }
        }
    }

    async fn write_sales(&self, db: &DatabaseConnection) -> Result<CheckoutReceipt> {
        let txn = db.begin().await?;
        let mut sale_ids = Vec::with_capacity(self.lines.len());
        let mut total = 0.0;

        for line in &self.lines {
            let current = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or(Error::ProductNotFound {
                    id: line.product_id,
                })?;

            let unit_price = current.price;
            let recorded =
                sale::record_sale(&txn, current.id, self.user_id, line.quantity, unit_price)
                    .await?;
            product::adjust_stock(&txn, current, -line.quantity).await?;

            total += recorded.revenue();
            sale_ids.push(recorded.id);
        }

        txn.commit().await?;
        Ok(CheckoutReceipt { sale_ids, total })
    }
}
