//! Cart operations for guests (session) and members (database).

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::instrument;

use purewell_core::models::{MAX_LINE_QUANTITY, Product};
use purewell_core::{CheckoutLine, MemberType, PriceView, ProductId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{CurrentMember, SessionCart, session_keys};

/// Whose cart an operation applies to.
#[derive(Clone, Copy)]
pub enum CartOwner<'a> {
    Member(&'a CurrentMember),
    Guest(&'a Session),
}

impl CartOwner<'_> {
    const fn viewer(&self) -> Option<MemberType> {
        match self {
            Self::Member(member) => Some(member.member_type),
            Self::Guest(_) => None,
        }
    }
}

/// One priced cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub model_code: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub price: PriceView,
    /// Unit price this viewer pays.
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// On sale with enough stock for this quantity.
    pub available: bool,
}

/// The cart as returned to the client.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: i32,
    pub subtotal: Decimal,
}

impl CartView {
    fn build(items: &[(ProductId, i32)], products: &[Product], viewer: Option<MemberType>) -> Self {
        let lines: Vec<CartLine> = items
            .iter()
            .filter_map(|(product_id, quantity)| {
                let product = products.iter().find(|p| p.id == *product_id)?;
                if !product.status.is_visible() {
                    return None;
                }
                let price = product.price_for(viewer);
                let unit_price = price.charged();
                Some(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    model_code: product.model_code.clone(),
                    image_url: product.image_url.clone(),
                    quantity: *quantity,
                    price,
                    unit_price,
                    line_total: unit_price * Decimal::from(*quantity),
                    available: product.can_fulfil(*quantity),
                })
            })
            .collect();

        Self {
            item_count: lines.iter().map(|l| l.quantity).sum(),
            subtotal: lines.iter().map(|l| l.line_total).sum(),
            lines,
        }
    }

    /// Lines for checkout arithmetic.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.lines
            .iter()
            .map(|l| CheckoutLine {
                product_id: l.product_id,
                unit_price: l.unit_price,
                quantity: l.quantity,
            })
            .collect()
    }

    /// First line that cannot be fulfilled right now.
    #[must_use]
    pub fn first_unavailable(&self) -> Option<&CartLine> {
        self.lines.iter().find(|l| !l.available)
    }
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The priced cart.
    #[instrument(skip_all)]
    pub async fn view(&self, owner: CartOwner<'_>) -> Result<CartView> {
        let items = self.items(owner).await?;
        let ids: Vec<ProductId> = items.iter().map(|(id, _)| *id).collect();
        let products = ProductRepository::new(self.pool).get_many(&ids).await?;
        Ok(CartView::build(&items, &products, owner.viewer()))
    }

    /// Add a product. The line total is capped at the stock on hand.
    #[instrument(skip(self, owner))]
    pub async fn add(&self, owner: CartOwner<'_>, product_id: ProductId, quantity: i32) -> Result<CartView> {
        check_quantity(quantity)?;
        let product = self.purchasable(product_id).await?;

        let held = self
            .items(owner)
            .await?
            .iter()
            .find(|(id, _)| *id == product_id)
            .map_or(0, |(_, q)| *q);
        let target = (held + quantity).min(product.stock).min(MAX_LINE_QUANTITY);
        let delta = target - held;

        if delta > 0 {
            match owner {
                CartOwner::Member(member) => {
                    CartRepository::new(self.pool)
                        .add(member.id, product_id, delta)
                        .await?;
                }
                CartOwner::Guest(session) => {
                    let mut cart = load_guest_cart(session).await?;
                    cart.add(product_id, delta);
                    save_guest_cart(session, &cart).await?;
                }
            }
        }

        self.view(owner).await
    }

    /// Set a line's quantity; zero removes the line.
    #[instrument(skip(self, owner))]
    pub async fn set_quantity(
        &self,
        owner: CartOwner<'_>,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView> {
        if quantity == 0 {
            return self.remove(owner, product_id).await;
        }
        check_quantity(quantity)?;

        let product = self.purchasable(product_id).await?;
        if quantity > product.stock {
            return Err(AppError::Conflict(format!(
                "Only {} left in stock",
                product.stock
            )));
        }

        match owner {
            CartOwner::Member(member) => {
                CartRepository::new(self.pool)
                    .set_quantity(member.id, product_id, quantity)
                    .await?;
            }
            CartOwner::Guest(session) => {
                let mut cart = load_guest_cart(session).await?;
                if !cart.set(product_id, quantity) {
                    return Err(AppError::NotFound("Product is not in the cart".to_string()));
                }
                save_guest_cart(session, &cart).await?;
            }
        }

        self.view(owner).await
    }

    /// Remove a line.
    #[instrument(skip(self, owner))]
    pub async fn remove(&self, owner: CartOwner<'_>, product_id: ProductId) -> Result<CartView> {
        match owner {
            CartOwner::Member(member) => {
                CartRepository::new(self.pool)
                    .remove(member.id, product_id)
                    .await?;
            }
            CartOwner::Guest(session) => {
                let mut cart = load_guest_cart(session).await?;
                if cart.remove(product_id) {
                    save_guest_cart(session, &cart).await?;
                }
            }
        }
        self.view(owner).await
    }

    /// Empty the cart.
    pub async fn clear(&self, owner: CartOwner<'_>) -> Result<()> {
        match owner {
            CartOwner::Member(member) => CartRepository::new(self.pool).clear(member.id).await?,
            CartOwner::Guest(session) => {
                session.remove::<SessionCart>(session_keys::GUEST_CART).await?;
            }
        }
        Ok(())
    }

    /// Move the guest cart into the member's cart after sign-in.
    #[instrument(skip_all, fields(member_id = %member.id))]
    pub async fn merge_guest_cart(&self, session: &Session, member: &CurrentMember) -> Result<()> {
        let Some(cart) = session
            .remove::<SessionCart>(session_keys::GUEST_CART)
            .await?
        else {
            return Ok(());
        };

        CartRepository::new(self.pool)
            .merge(member.id, &cart.to_pairs())
            .await?;
        Ok(())
    }

    async fn items(&self, owner: CartOwner<'_>) -> Result<Vec<(ProductId, i32)>> {
        match owner {
            CartOwner::Member(member) => Ok(CartRepository::new(self.pool)
                .list(member.id)
                .await?
                .into_iter()
                .map(|item| (item.product_id, item.quantity))
                .collect()),
            CartOwner::Guest(session) => Ok(load_guest_cart(session).await?.to_pairs()),
        }
    }

    async fn purchasable(&self, product_id: ProductId) -> Result<Product> {
        let product = ProductRepository::new(self.pool)
            .get_visible(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if !product.can_fulfil(1) {
            return Err(AppError::Conflict("Product is sold out".to_string()));
        }
        Ok(product)
    }
}

fn check_quantity(quantity: i32) -> Result<()> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )))
    }
}

async fn load_guest_cart(session: &Session) -> Result<SessionCart> {
    Ok(session
        .get::<SessionCart>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

async fn save_guest_cart(session: &Session, cart: &SessionCart) -> Result<()> {
    session.insert(session_keys::GUEST_CART, cart).await?;
    Ok(())
}
