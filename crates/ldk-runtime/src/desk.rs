use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use ldk_config::Settings;
use ldk_export::ExportOutcome;
use ldk_normalize::{
    format_phone_display, validate_client, validate_meridian_item, validate_mkl_order,
    validate_product_name,
};
use ldk_schemas::{
    Catalog, Client, ClientInput, LifecycleStatus, MeridianFilter, MeridianItem, MeridianItemInput, MeridianOrder,
    MeridianOrderSummary, MeridianStatus, MklFilter, MklOrder, MklOrderInput, MklStatus,
    ProductEntry,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};

/// Client row as listed, with the display form of its phone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub phone_display: String,
}

impl From<Client> for ClientView {
    fn from(client: Client) -> Self {
        let phone_display = format_phone_display(&client.phone_digits);
        Self {
            client,
            phone_display,
        }
    }
}

/// Serialized access to the order store.
pub struct Desk {
    pub(crate) pool: SqlitePool,
    gate: Mutex<()>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Desk {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            gate: Mutex::new(()),
            clock,
        }
    }

    pub fn with_system_clock(pool: SqlitePool) -> Self {
        Self::new(pool, Arc::new(SystemClock))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    pub async fn list_clients(&self, query: Option<&str>) -> Result<Vec<ClientView>> {
        let _g = self.lock().await;
        let rows = ldk_db::list_clients(&self.pool, query).await?;
        Ok(rows.into_iter().map(ClientView::from).collect())
    }

    pub async fn create_client(&self, input: &ClientInput) -> Result<ClientView> {
        let draft = validate_client(input)?;
        let _g = self.lock().await;
        Ok(ldk_db::insert_client(&self.pool, &draft).await?.into())
    }

    pub async fn update_client(&self, id: i64, input: &ClientInput) -> Result<ClientView> {
        let draft = validate_client(input)?;
        let _g = self.lock().await;
        Ok(ldk_db::update_client(&self.pool, id, &draft).await?.into())
    }

    pub async fn delete_client(&self, id: i64) -> Result<()> {
        let _g = self.lock().await;
        ldk_db::delete_client(&self.pool, id).await
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    pub async fn list_products(&self, catalog: Catalog) -> Result<Vec<ProductEntry>> {
        let _g = self.lock().await;
        ldk_db::list_products(&self.pool, catalog).await
    }

    pub async fn add_product(&self, catalog: Catalog, name: &str) -> Result<ProductEntry> {
        let name = validate_product_name(name)?;
        let _g = self.lock().await;
        ldk_db::insert_product(&self.pool, catalog, &name).await
    }

    pub async fn rename_product(&self, catalog: Catalog, id: i64, name: &str) -> Result<ProductEntry> {
        let name = validate_product_name(name)?;
        let _g = self.lock().await;
        ldk_db::rename_product(&self.pool, catalog, id, &name).await
    }

    pub async fn delete_product(&self, catalog: Catalog, id: i64) -> Result<()> {
        let _g = self.lock().await;
        ldk_db::delete_product(&self.pool, catalog, id).await
    }

    // -----------------------------------------------------------------------
    // MKL orders
    // -----------------------------------------------------------------------

    pub async fn list_mkl_orders(&self, filter: &MklFilter) -> Result<Vec<MklOrder>> {
        let _g = self.lock().await;
        ldk_db::list_mkl_orders(&self.pool, filter).await
    }

    pub async fn get_mkl_order(&self, id: i64) -> Result<MklOrder> {
        let _g = self.lock().await;
        ldk_db::fetch_mkl_order(&self.pool, id).await
    }

    pub async fn create_mkl_order(&self, input: &MklOrderInput) -> Result<MklOrder> {
        let draft = validate_mkl_order(input)?;
        let _g = self.lock().await;
        let order = ldk_db::insert_mkl_order(&self.pool, &draft, self.now()).await?;
        tracing::info!(id = order.id, "mkl order created");
        Ok(order)
    }

    pub async fn update_mkl_order(&self, id: i64, input: &MklOrderInput) -> Result<MklOrder> {
        let draft = validate_mkl_order(input)?;
        let _g = self.lock().await;
        ldk_db::update_mkl_order(&self.pool, id, &draft).await
    }

    pub async fn delete_mkl_order(&self, id: i64) -> Result<()> {
        let _g = self.lock().await;
        ldk_db::delete_mkl_order(&self.pool, id).await
    }

    pub async fn set_mkl_status(&self, id: i64, status: MklStatus) -> Result<MklOrder> {
        let _g = self.lock().await;
        let current = ldk_db::fetch_mkl_order(&self.pool, id).await?;
        let stamp = current.stamp().transition(status, self.now());
        let order = ldk_db::set_mkl_status(&self.pool, id, stamp).await?;
        tracing::info!(
            id,
            from = current.status.as_str(),
            to = status.as_str(),
            "mkl status changed"
        );
        Ok(order)
    }

    // -----------------------------------------------------------------------
    // Meridian orders
    // -----------------------------------------------------------------------

    pub async fn list_meridian_orders(
        &self,
        filter: &MeridianFilter,
    ) -> Result<Vec<MeridianOrderSummary>> {
        let _g = self.lock().await;
        ldk_db::list_meridian_orders(&self.pool, filter).await
    }

    pub async fn get_meridian_order(&self, id: i64) -> Result<MeridianOrder> {
        let _g = self.lock().await;
        ldk_db::fetch_meridian_order(&self.pool, id).await
    }

    pub async fn create_meridian_order(&self) -> Result<MeridianOrder> {
        let _g = self.lock().await;
        let order = ldk_db::insert_meridian_order(&self.pool, self.now()).await?;
        tracing::info!(id = order.id, title = %order.title, "meridian order created");
        Ok(order)
    }

    pub async fn delete_meridian_order(&self, id: i64) -> Result<()> {
        let _g = self.lock().await;
        ldk_db::delete_meridian_order(&self.pool, id).await
    }

    pub async fn set_meridian_status(&self, id: i64, status: MeridianStatus) -> Result<MeridianOrder> {
        let _g = self.lock().await;
        let current = ldk_db::fetch_meridian_order(&self.pool, id).await?;
        let stamp = current.stamp().transition(status, self.now());
        let order = ldk_db::set_meridian_status(&self.pool, id, stamp).await?;
        tracing::info!(
            id,
            from = current.status.as_str(),
            to = status.as_str(),
            "meridian status changed"
        );
        Ok(order)
    }

    pub async fn list_meridian_items(&self, order_id: i64) -> Result<Vec<MeridianItem>> {
        let _g = self.lock().await;
        ldk_db::list_meridian_items(&self.pool, order_id).await
    }

    pub async fn add_meridian_item(
        &self,
        order_id: i64,
        input: &MeridianItemInput,
    ) -> Result<MeridianItem> {
        let draft = validate_meridian_item(input)?;
        let _g = self.lock().await;
        ldk_db::insert_meridian_item(&self.pool, order_id, &draft).await
    }

    pub async fn update_meridian_item(&self, id: i64, input: &MeridianItemInput) -> Result<MeridianItem> {
        let draft = validate_meridian_item(input)?;
        let _g = self.lock().await;
        ldk_db::update_meridian_item(&self.pool, id, &draft).await
    }

    pub async fn delete_meridian_item(&self, id: i64) -> Result<()> {
        let _g = self.lock().await;
        ldk_db::delete_meridian_item(&self.pool, id).await
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Write the unfulfilled-orders report for `catalog` into the configured
    /// export directory, dated by the shop's local date.
    pub async fn export_unordered(&self, catalog: Catalog, settings: &Settings) -> Result<ExportOutcome> {
        let _g = self.lock().await;
        let rows = match catalog {
            Catalog::Mkl => ldk_db::mkl_export_rows(&self.pool).await?,
            Catalog::Meridian => ldk_db::meridian_export_rows(&self.pool).await?,
        };
        let date = settings.zone().wall_clock(self.now()).date();
        ldk_export::write_export(&settings.export_directory, catalog, date, &rows)
    }
}
